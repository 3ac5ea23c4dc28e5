//! Frame description types

/// Largest meaningful value of a Y14 intensity sample.
pub const Y14_MAX: u16 = 16383;

/// Value given to every in-band pixel when the in-band region is flat.
pub const Y14_MID: u16 = 8191;

/// Pixel layout delivered by the camera for a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// 14-bit intensity stored in 16-bit words
    Y14,
    /// 16-bit native intensity, down-converted to Y14 before use
    Y16,
    /// Packed YUYV, no intensity data available
    Yuv422,
}

impl InputFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        2
    }
}

/// Pixel layout requested from the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Y14,
    Yuv444,
    Yuv422,
    Rgb888,
    Bgr888,
}

impl OutputFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            OutputFormat::Y14 | OutputFormat::Yuv422 => 2,
            OutputFormat::Yuv444 | OutputFormat::Rgb888 | OutputFormat::Bgr888 => 3,
        }
    }
}

/// Mirror (horizontal) and flip (vertical) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorFlip {
    #[default]
    None,
    Mirror,
    Flip,
    /// Mirror first, then flip the mirrored result
    MirrorFlip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Left90,
    Right90,
    Rotate180,
}

impl Rotation {
    /// Whether consumers must swap width and height after this rotation.
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Left90 | Rotation::Right90)
    }
}

/// Describes one image plane and how it should be converted.
///
/// `byte_size` is an output: every conversion call overwrites it with the
/// size of the produced frame, or 0 when the conversion is unsupported.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub width: usize,
    pub height: usize,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub enhance: bool,
    pub pseudo_color: bool,
    pub mirror_flip: MirrorFlip,
    pub rotation: Rotation,
    pub byte_size: usize,
}

impl FrameInfo {
    /// Y14 in, pseudo-colored BGR out, no enhancement and no transform.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            input_format: InputFormat::Y14,
            output_format: OutputFormat::Bgr888,
            enhance: false,
            pseudo_color: true,
            mirror_flip: MirrorFlip::None,
            rotation: Rotation::None,
            byte_size: 0,
        }
    }

    pub fn with_input(mut self, format: InputFormat) -> Self {
        self.input_format = format;
        self
    }

    pub fn with_output(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_enhance(mut self, enable: bool) -> Self {
        self.enhance = enable;
        self
    }

    pub fn with_pseudo_color(mut self, enable: bool) -> Self {
        self.pseudo_color = enable;
        self
    }

    pub fn with_mirror_flip(mut self, mirror_flip: MirrorFlip) -> Self {
        self.mirror_flip = mirror_flip;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Bytes a successful conversion of this plane produces.
    pub fn output_byte_size(&self) -> usize {
        self.pixel_count() * self.output_format.bytes_per_pixel()
    }

    /// Width and height as seen after the configured rotation.
    pub fn display_dimensions(&self) -> (usize, usize) {
        if self.rotation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}
