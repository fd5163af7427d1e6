// MARK: - PixelFormat

/// Pixel layout of a captured frame: four channels, alpha first.
///
/// The tag strings ("ARGB u8", …) are what the downstream mapper sees in
/// logs; the wire carries [`PixelFormat::code`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per channel, 4 bytes per pixel.
    ArgbU8,
    /// 16 bits per channel, 8 bytes per pixel.
    ArgbU16,
    /// 32 bits per channel, 16 bytes per pixel.
    ArgbU32,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::ArgbU8 => 4,
            Self::ArgbU16 => 8,
            Self::ArgbU32 => 16,
        }
    }

    /// Stable one-byte code used in the wire header.
    pub const fn code(self) -> u8 {
        match self {
            Self::ArgbU8 => 1,
            Self::ArgbU16 => 2,
            Self::ArgbU32 => 3,
        }
    }

    /// Canonical tag string.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ArgbU8 => "ARGB u8",
            Self::ArgbU16 => "ARGB u16",
            Self::ArgbU32 => "ARGB u32",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// MARK: - FrameBuffer

/// Owned, fixed-size pixel buffer a capture backend writes into.
///
/// The byte length is locked at construction to
/// `width × height × bytes_per_pixel(format)`; mutation is only handed out
/// as `&mut [u8]`, so no capture can grow or shrink the allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width:      u32,
    height:     u32,
    format:     PixelFormat,
    big_endian: bool,
    data:       Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer for `width × height` pixels of `format`.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            big_endian: false,
            data: vec![0; len],
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout of the raw bytes.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Byte order of multi-byte channel values.
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Refresh the byte-order flag; done after every capture so the buffer
    /// always describes what the active backend produced.
    pub fn set_big_endian(&mut self, big_endian: bool) {
        self.big_endian = big_endian;
    }

    /// Total byte length; constant for the life of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read access to the raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Write access for capture backends.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_len_is_width_height_bpp() {
        assert_eq!(FrameBuffer::new(192, 128, PixelFormat::ArgbU8).len(), 192 * 128 * 4);
        assert_eq!(FrameBuffer::new(3, 5, PixelFormat::ArgbU16).len(), 3 * 5 * 8);
        assert_eq!(FrameBuffer::new(3, 5, PixelFormat::ArgbU32).len(), 3 * 5 * 16);
    }

    #[test]
    fn zero_area_buffer_is_empty() {
        assert!(FrameBuffer::new(0, 7, PixelFormat::ArgbU8).is_empty());
        assert!(FrameBuffer::new(7, 0, PixelFormat::ArgbU8).is_empty());
    }

    #[test]
    fn endianness_flag_toggles() {
        let mut frame = FrameBuffer::new(2, 2, PixelFormat::ArgbU8);
        assert!(!frame.is_big_endian());
        frame.set_big_endian(true);
        assert!(frame.is_big_endian());
        frame.set_big_endian(false);
        assert!(!frame.is_big_endian());
    }

    #[test]
    fn format_tags_and_codes_are_stable() {
        assert_eq!(PixelFormat::ArgbU8.to_string(), "ARGB u8");
        assert_eq!(PixelFormat::ArgbU16.to_string(), "ARGB u16");
        assert_eq!(PixelFormat::ArgbU32.to_string(), "ARGB u32");
        assert_eq!(PixelFormat::ArgbU8.code(), 1);
        assert_eq!(PixelFormat::ArgbU16.code(), 2);
        assert_eq!(PixelFormat::ArgbU32.code(), 3);
    }

    #[test]
    fn writes_through_data_mut_land_in_data() {
        let mut frame = FrameBuffer::new(2, 1, PixelFormat::ArgbU8);
        frame.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.len(), 8);
    }
}
