use image::imageops::FilterType;
use image::RgbImage;
use rten_tensor::NdTensor;

pub const SHORTEST_EDGE: u32 = 800;
pub const LONGEST_EDGE: u32 = 1333;
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Output size (width, height) for DETR-style resizing: shortest edge becomes
/// `shortest`, unless that would push the longest edge past `longest`.
pub fn resize_dimensions(width: u32, height: u32, shortest: u32, longest: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let min_orig = w.min(h);
    let max_orig = w.max(h);

    let mut size = shortest as f64;
    if max_orig / min_orig * size > longest as f64 {
        size = (longest as f64 * min_orig / max_orig).round();
    }
    // Very thin images would otherwise round the short edge down to zero
    let size = size.max(1.0);

    if (height <= width && h == size) || (width <= height && w == size) {
        return (width, height);
    }

    if width < height {
        (size as u32, ((size * h / w) as u32).max(1))
    } else {
        (((size * w / h) as u32).max(1), size as u32)
    }
}

/// Resize to the model's working resolution
pub fn resize_for_model(img: &RgbImage) -> RgbImage {
    let (width, height) =
        resize_dimensions(img.width(), img.height(), SHORTEST_EDGE, LONGEST_EDGE);
    if (width, height) == img.dimensions() {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Rescale to [0, 1], normalise per channel and lay out as NCHW
pub fn to_normalized_tensor(img: &RgbImage) -> NdTensor<f32, 4> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    NdTensor::from_data([1, 3, height as usize, width as usize], data)
}

/// All-ones mask matching the resized input
pub fn pixel_mask(width: u32, height: u32) -> NdTensor<i32, 3> {
    NdTensor::from_data(
        [1, height as usize, width as usize],
        vec![1; (width * height) as usize],
    )
}
