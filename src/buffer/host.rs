use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    buffer::desc::{BufferDesc, ElemType},
    rmat::View,
    utils::error::RMatError,
};

/// Host-resident 2-D buffer with an explicit row step.
#[derive(Clone, Debug, Default)]
pub struct HostMat {
    desc: BufferDesc,
    step: usize,
    data: Vec<u8>,
}

impl HostMat {
    /// Zero-filled, densely packed buffer
    pub fn new(desc: BufferDesc) -> Self {
        Self {
            desc,
            step: desc.row_bytes(),
            data: vec![0u8; desc.size_in_bytes()],
        }
    }

    /// Zero-filled buffer whose rows are `step` bytes apart.
    pub fn with_step(desc: BufferDesc, step: usize) -> Result<Self, RMatError> {
        if step < desc.row_bytes() {
            return Err(RMatError::InvalidStep {
                step,
                row_bytes: desc.row_bytes(),
            });
        }

        Ok(Self {
            desc,
            step,
            data: vec![0u8; desc.rows() * step],
        })
    }

    /// Wrap densely packed bytes.
    pub fn from_bytes(desc: BufferDesc, data: Vec<u8>) -> Result<Self, RMatError> {
        if data.len() != desc.size_in_bytes() {
            return Err(RMatError::SizeMismatch {
                expected: desc.size_in_bytes(),
                actual: data.len(),
            });
        }

        Ok(Self {
            desc,
            step: desc.row_bytes(),
            data,
        })
    }

    /// Deep copy of the rows visible through `view`.
    pub fn from_view(view: &View<'_>) -> Self {
        let mut mat = Self::new(view.desc());
        for y in 0..view.rows() {
            mat.row_mut(y).copy_from_slice(view.row(y));
        }
        mat
    }

    pub fn from_image(img: DynamicImage) -> Result<Self, RMatError> {
        let (cols, rows) = (img.width() as usize, img.height() as usize);
        let (elem, bytes) = match img {
            DynamicImage::ImageLuma8(buf) => (ElemType::U8C1, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (ElemType::U8C3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (ElemType::U8C4, buf.into_raw()),
            other => {
                return Err(RMatError::UnsupportedImage(format!(
                    "{:?}",
                    other.color()
                )));
            }
        };
        Self::from_bytes(BufferDesc::new(elem, rows, cols), bytes)
    }

    pub fn to_image(&self) -> Result<DynamicImage, RMatError> {
        let (w, h) = (self.desc.cols() as u32, self.desc.rows() as u32);
        let bytes = self.to_dense_bytes();

        let img = match self.desc.elem_type() {
            ElemType::U8C1 => GrayImage::from_raw(w, h, bytes).map(DynamicImage::ImageLuma8),
            ElemType::U8C3 => RgbImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgb8),
            ElemType::U8C4 => RgbaImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgba8),
            other => return Err(RMatError::UnsupportedImage(other.to_string())),
        };

        img.ok_or_else(|| {
            RMatError::UnsupportedImage(format!("{} does not fit an image buffer", self.desc))
        })
    }

    pub fn desc(&self) -> BufferDesc {
        self.desc
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.step;
        &self.data[start..start + self.desc.row_bytes()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.step;
        let len = self.desc.row_bytes();
        &mut self.data[start..start + len]
    }

    pub fn fill(&mut self, value: u8) {
        for y in 0..self.desc.rows() {
            self.row_mut(y).fill(value);
        }
    }

    /// Copy every row into `dst`, re-creating it first when its descriptor differs.
    pub fn copy_to(&self, dst: &mut HostMat) {
        if dst.desc != self.desc {
            *dst = HostMat::new(self.desc);
        }
        for y in 0..self.desc.rows() {
            dst.row_mut(y).copy_from_slice(self.row(y));
        }
    }

    /// Copy the rows into `dst` back to back, without padding.
    pub fn gather_rows(&self, dst: &mut [u8]) -> Result<(), RMatError> {
        self.check_dense_len(dst.len())?;
        let row_bytes = self.desc.row_bytes();
        if row_bytes == 0 {
            return Ok(());
        }
        for (y, out) in dst.chunks_exact_mut(row_bytes).enumerate() {
            out.copy_from_slice(self.row(y));
        }
        Ok(())
    }

    /// Inverse of [`HostMat::gather_rows`]: spread densely packed rows across `self`.
    pub fn scatter_rows(&mut self, src: &[u8]) -> Result<(), RMatError> {
        self.check_dense_len(src.len())?;
        let row_bytes = self.desc.row_bytes();
        if row_bytes == 0 {
            return Ok(());
        }
        for (y, row) in src.chunks_exact(row_bytes).enumerate() {
            self.row_mut(y).copy_from_slice(row);
        }
        Ok(())
    }

    fn check_dense_len(&self, len: usize) -> Result<(), RMatError> {
        if len != self.desc.size_in_bytes() {
            return Err(RMatError::SizeMismatch {
                expected: self.desc.size_in_bytes(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Rows concatenated without padding.
    pub fn to_dense_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.desc.size_in_bytes());
        for y in 0..self.desc.rows() {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Largest byte-wise difference, `None` when the descriptors differ.
    pub fn max_abs_diff(&self, other: &HostMat) -> Option<u8> {
        if self.desc != other.desc {
            return None;
        }
        (0..self.desc.rows())
            .flat_map(|y| self.row(y).iter().zip(other.row(y)))
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .or(Some(0))
    }
}

// Padding bytes between rows never take part in the comparison
impl PartialEq for HostMat {
    fn eq(&self, other: &Self) -> bool {
        self.max_abs_diff(other) == Some(0)
    }
}

impl Eq for HostMat {}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(rows: usize, cols: usize) -> BufferDesc {
        BufferDesc::new(ElemType::U8C1, rows, cols)
    }

    #[test]
    fn from_bytes_checks_length() {
        let err = HostMat::from_bytes(gray(2, 2), vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            RMatError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn with_step_rejects_short_rows() {
        let err = HostMat::with_step(gray(2, 8), 4).unwrap_err();
        assert!(matches!(err, RMatError::InvalidStep { step: 4, row_bytes: 8 }));
    }

    #[test]
    fn equality_ignores_padding() {
        let dense = HostMat::from_bytes(gray(2, 3), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut padded = HostMat::with_step(gray(2, 3), 8).unwrap();
        padded.row_mut(0).copy_from_slice(&[1, 2, 3]);
        padded.row_mut(1).copy_from_slice(&[4, 5, 6]);

        assert_eq!(padded.step(), 8);
        assert_eq!(dense, padded);
        assert_eq!(padded.to_dense_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn gather_drops_row_padding() {
        let mut padded = HostMat::with_step(gray(3, 2), 5).unwrap();
        padded.row_mut(0).copy_from_slice(&[1, 2]);
        padded.row_mut(1).copy_from_slice(&[3, 4]);
        padded.row_mut(2).copy_from_slice(&[5, 6]);

        let mut dense = [0u8; 6];
        padded.gather_rows(&mut dense).unwrap();
        assert_eq!(dense, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn scatter_fills_padded_rows_only() {
        let mut padded = HostMat::with_step(gray(2, 3), 4).unwrap();
        padded.scatter_rows(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(padded.row(0), &[1, 2, 3]);
        assert_eq!(padded.row(1), &[4, 5, 6]);
        assert_eq!(padded.data, vec![1, 2, 3, 0, 4, 5, 6, 0]);
    }

    #[test]
    fn dense_step_gathers_and_scatters_verbatim() {
        let bytes: Vec<u8> = (0..12).collect();
        let src = HostMat::from_bytes(BufferDesc::new(ElemType::U8C3, 2, 2), bytes.clone()).unwrap();
        let mut out = vec![0u8; 12];
        src.gather_rows(&mut out).unwrap();
        assert_eq!(out, bytes);

        let mut dst = HostMat::new(src.desc());
        dst.scatter_rows(&out).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn gather_and_scatter_check_length() {
        let mut mat = HostMat::with_step(gray(2, 2), 4).unwrap();
        let mut short = [0u8; 3];
        assert!(matches!(
            mat.gather_rows(&mut short),
            Err(RMatError::SizeMismatch { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            mat.scatter_rows(&[0; 8]),
            Err(RMatError::SizeMismatch { expected: 4, actual: 8 })
        ));
    }

    #[test]
    fn empty_buffer_gathers_nothing() {
        let mut mat = HostMat::new(gray(0, 4));
        mat.gather_rows(&mut []).unwrap();
        mat.scatter_rows(&[]).unwrap();
    }

    #[test]
    fn max_abs_diff_reports_largest_gap() {
        let a = HostMat::from_bytes(gray(1, 3), vec![10, 20, 30]).unwrap();
        let b = HostMat::from_bytes(gray(1, 3), vec![10, 25, 0]).unwrap();
        assert_eq!(a.max_abs_diff(&b), Some(30));
        assert_eq!(a.max_abs_diff(&HostMat::new(gray(3, 1))), None);
    }

    #[test]
    fn copy_to_recreates_mismatched_destination() {
        let mut src = HostMat::new(gray(4, 4));
        src.fill(9);
        let mut dst = HostMat::new(BufferDesc::new(ElemType::U8C3, 1, 1));
        src.copy_to(&mut dst);
        assert_eq!(dst.desc(), src.desc());
        assert_eq!(dst, src);
    }

    #[test]
    fn image_round_trip() {
        let img = RgbImage::from_fn(5, 3, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let mat = HostMat::from_image(DynamicImage::ImageRgb8(img.clone())).unwrap();

        assert_eq!(mat.desc(), BufferDesc::new(ElemType::U8C3, 3, 5));
        assert_eq!(&mat.row(2)[3..6], &[1, 2, 7]);

        let back = mat.to_image().unwrap();
        assert_eq!(back.to_rgb8(), img);
    }

    #[test]
    fn to_image_rejects_float_buffers() {
        let mat = HostMat::new(BufferDesc::new(ElemType::F32C1, 2, 2));
        assert!(matches!(
            mat.to_image(),
            Err(RMatError::UnsupportedImage(_))
        ));
    }
}
