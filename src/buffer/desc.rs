use std::fmt;

/// Numeric kind of a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Depth {
    #[default]
    U8,
    S8,
    U16,
    S16,
    S32,
    F16,
    F32,
    F64,
}

impl Depth {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Depth::U8 | Depth::S8 => 1,
            Depth::U16 | Depth::S16 | Depth::F16 => 2,
            Depth::S32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Depth::U8 => "8U",
            Depth::S8 => "8S",
            Depth::U16 => "16U",
            Depth::S16 => "16S",
            Depth::S32 => "32S",
            Depth::F16 => "16F",
            Depth::F32 => "32F",
            Depth::F64 => "64F",
        }
    }
}

/// Element type of a buffer: numeric kind x channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElemType {
    depth: Depth,
    channels: u8,
}

impl ElemType {
    pub const U8C1: ElemType = ElemType::new(Depth::U8, 1);
    pub const U8C3: ElemType = ElemType::new(Depth::U8, 3);
    pub const U8C4: ElemType = ElemType::new(Depth::U8, 4);
    pub const F32C1: ElemType = ElemType::new(Depth::F32, 1);

    pub const fn new(depth: Depth, channels: u8) -> Self {
        assert!(
            channels >= 1 && channels <= 4,
            "Channel count must be between 1 and 4"
        );
        Self { depth, channels }
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// Bytes taken by one element (all channels).
    pub fn elem_size(&self) -> usize {
        self.depth.size_in_bytes() * self.channels()
    }
}

impl Default for ElemType {
    fn default() -> Self {
        ElemType::U8C1
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.depth.code(), self.channels)
    }
}

/// Shape and element type of a 2-D buffer.
///
/// The default value is the empty descriptor (0x0), used by placeholder views
/// and adapters that do not describe any memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BufferDesc {
    elem: ElemType,
    rows: usize,
    cols: usize,
}

impl BufferDesc {
    pub fn new(elem: ElemType, rows: usize, cols: usize) -> Self {
        Self { elem, rows, cols }
    }

    pub fn elem_type(&self) -> ElemType {
        self.elem
    }

    pub fn depth(&self) -> Depth {
        self.elem.depth()
    }

    pub fn channels(&self) -> usize {
        self.elem.channels()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn num_elements(&self) -> usize {
        self.rows * self.cols
    }

    /// Bytes in one densely packed row.
    pub fn row_bytes(&self) -> usize {
        self.cols * self.elem.elem_size()
    }

    /// Bytes of the densely packed buffer.
    pub fn size_in_bytes(&self) -> usize {
        self.rows * self.row_bytes()
    }
}

impl fmt::Display for BufferDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.elem, self.rows, self.cols)
    }
}
