//! Burn dataset and batcher for image classification
//!
//! `ClassifierItem` holds one decoded image as a flattened CHW float array
//! in [0, 1]. `ClassifierDataset` implements Burn's `Dataset` trait over a
//! fully pre-loaded item vector, so decode failures surface at construction
//! time rather than mid-epoch. `ClassifierBatcher` collates items into the
//! stacked tensors consumed by the model, applying the fixed per-channel
//! normalization (x - 0.5) / 0.5.

use std::marker::PhantomData;
use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::utils::error::{ClassifierError, Result};

/// One decoded sample, ready for batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierItem {
    /// Image data as a flattened CHW float array of length 3 * size * size,
    /// values in [0, 1]
    pub image: Vec<f32>,
    /// Class label index
    pub label: usize,
    /// Source path, kept for diagnostics
    pub path: String,
}

impl ClassifierItem {
    /// Decode an image file, resize it to `image_size` x `image_size`, and
    /// convert it to CHW floats in [0, 1].
    pub fn from_path(path: &PathBuf, label: usize, image_size: usize) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| ClassifierError::Image(path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| ClassifierError::Image(path.clone(), e.to_string()))?
            .resize_exact(image_size as u32, image_size as u32, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (image_size, image_size);
        let mut image = vec![0.0f32; 3 * height * width];

        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * width + x] = pixel[0] as f32 / 255.0;
                image[height * width + y * width + x] = pixel[1] as f32 / 255.0;
                image[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(Self {
            image,
            label,
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Build an item from already-decoded pixel data
    pub fn from_data(image: Vec<f32>, label: usize, path: String) -> Self {
        Self { image, label, path }
    }
}

/// In-memory image dataset implementing Burn's `Dataset` trait
#[derive(Debug, Clone)]
pub struct ClassifierDataset {
    items: Vec<ClassifierItem>,
}

impl ClassifierDataset {
    /// Decode every (path, label) pair up front.
    ///
    /// Any unreadable or malformed image aborts the whole load.
    pub fn load(samples: Vec<(PathBuf, usize)>, image_size: usize) -> Result<Self> {
        let items = samples
            .iter()
            .map(|(path, label)| ClassifierItem::from_path(path, *label, image_size))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { items })
    }

    /// Build a dataset from pre-decoded items
    pub fn from_items(items: Vec<ClassifierItem>) -> Self {
        Self { items }
    }

    /// Number of classes, derived from the largest label present
    pub fn num_classes(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.label)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }
}

impl Dataset<ClassifierItem> for ClassifierDataset {
    fn get(&self, index: usize) -> Option<ClassifierItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A collated batch of images and targets
#[derive(Clone, Debug)]
pub struct ClassifierBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width], normalized
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher collating items into `ClassifierBatch`es
#[derive(Clone, Debug)]
pub struct ClassifierBatcher<B: Backend> {
    image_size: usize,
    _backend: PhantomData<B>,
}

impl<B: Backend> ClassifierBatcher<B> {
    /// Create a batcher for images of the given square size
    pub fn new(image_size: usize) -> Self {
        Self {
            image_size,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, ClassifierItem, ClassifierBatch<B>> for ClassifierBatcher<B> {
    fn batch(&self, items: Vec<ClassifierItem>, device: &B::Device) -> ClassifierBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;

        let images_data: Vec<f32> = items
            .iter()
            .flat_map(|item| item.image.iter().copied())
            .collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        // Fixed normalization: every channel uses mean 0.5 and std 0.5,
        // mapping [0, 1] pixel values to [-1, 1]
        let images = (images - 0.5) / 0.5;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ClassifierBatch { images, targets }
    }
}
