//! Fashion-MNIST test split, read from the IDX files the dataset ships as.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::info;
use ndarray::{Array4, ArrayD, IxDyn};

use crate::data::InMemorySource;
use crate::error::{Error, Result};

pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

/// Parses an IDX file of unsigned bytes, returning its dimensions and data.
pub fn read_idx<R: Read>(mut reader: R, magic: u32) -> Result<ArrayD<u8>> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word)?;
    let found = u32::from_be_bytes(word);
    if found != magic {
        return Err(Error::DataFormat(format!(
            "bad IDX magic number {:#010x}, expected {:#010x}",
            found, magic
        )));
    }

    let rank = (magic & 0xff) as usize;
    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
        reader.read_exact(&mut word)?;
        dims.push(u32::from_be_bytes(word) as usize);
    }

    let mut data = vec![0u8; dims.iter().product()];
    reader.read_exact(&mut data)?;
    Ok(ArrayD::from_shape_vec(IxDyn(&dims), data)?)
}

/// Opens `<dir>/<name>`, falling back to `<dir>/<name>.gz`.
fn open_idx(dir: &Path, name: &str) -> Result<Box<dyn Read>> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Ok(Box::new(BufReader::new(File::open(plain)?)));
    }
    let gz: PathBuf = dir.join(format!("{}.gz", name));
    let file = File::open(&gz).map_err(|e| {
        Error::DataFormat(format!("cannot open {} or {}: {}", plain.display(), gz.display(), e))
    })?;
    Ok(Box::new(GzDecoder::new(BufReader::new(file))))
}

/// Scales pixels to `[0, 1]` and adds a trailing channel axis: `[N, H, W, 1]`.
pub fn normalize_images(images: &ArrayD<u8>) -> Result<ArrayD<f32>> {
    let images = images.view().into_dimensionality::<ndarray::Ix3>()?;
    let (n, h, w) = images.dim();
    let scaled = Array4::from_shape_fn((n, h, w, 1), |(i, y, x, _)| images[[i, y, x]] as f32 / 255.0);
    Ok(scaled.into_dyn())
}

pub fn load_test_split(dir: &Path) -> Result<(ArrayD<f32>, Vec<i64>)> {
    let images = read_idx(open_idx(dir, TEST_IMAGES)?, IMAGES_MAGIC)?;
    let labels = read_idx(open_idx(dir, TEST_LABELS)?, LABELS_MAGIC)?;
    let inputs = normalize_images(&images)?;
    let labels: Vec<i64> = labels.iter().map(|&l| l as i64).collect();
    info!("loaded {} test images of shape {:?}", labels.len(), &inputs.shape()[1..]);
    Ok((inputs, labels))
}

/// The test split cut into batches; the last batch may be smaller.
pub fn inference_source(dir: &Path, batch_size: usize) -> Result<InMemorySource> {
    let (inputs, labels) = load_test_split(dir)?;
    InMemorySource::new(inputs, labels, batch_size, false)
}
