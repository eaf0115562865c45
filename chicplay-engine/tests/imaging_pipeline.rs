use async_trait::async_trait;
use chicplay_engine::imaging::encode::{decode_data_url, decode_rgba, encode_png, png_data_url};
use chicplay_engine::{
    BackgroundRemovalService, BlendMode, BlendOptions, BodyConfig, BodyType, DefaultImageSource,
    DressBlender, ImagingConfig, ImagingError, NoModel, ProgressSink, RemovalOptions,
    SegmentationModel,
};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Pretends to segment by returning the input untouched, after a short
/// delay so concurrent callers overlap.
#[derive(Default)]
struct CountingModel {
    calls: AtomicUsize,
}

#[async_trait]
impl SegmentationModel for CountingModel {
    async fn remove_background(
        &self,
        image: &[u8],
        _options: &RemovalOptions,
        progress: &ProgressSink,
    ) -> Result<Vec<u8>, ImagingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report("inference", 0, 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        progress.report("inference", 1, 1);
        Ok(image.to_vec())
    }

    async fn preload(&self, _options: &RemovalOptions) -> Result<(), ImagingError> {
        Ok(())
    }
}

/// Model that answers with bytes that are not an image.
struct GarbageModel;

#[async_trait]
impl SegmentationModel for GarbageModel {
    async fn remove_background(
        &self,
        _image: &[u8],
        _options: &RemovalOptions,
        _progress: &ProgressSink,
    ) -> Result<Vec<u8>, ImagingError> {
        Ok(b"garbage".to_vec())
    }

    async fn preload(&self, _options: &RemovalOptions) -> Result<(), ImagingError> {
        Err(ImagingError::Model("offline".to_string()))
    }
}

fn studio_photo() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(40, 60, Rgba([255, 255, 255, 255]));
    for y in 15..45 {
        for x in 12..28 {
            img.put_pixel(x, y, Rgba([150, 20, 60, 255]));
        }
    }
    img
}

fn studio_photo_url() -> String {
    png_data_url(&encode_png(&studio_photo()).unwrap())
}

fn blender_with(model: Arc<dyn SegmentationModel>) -> DressBlender {
    let removal = BackgroundRemovalService::new(Arc::new(DefaultImageSource::new()), model);
    DressBlender::new(Arc::new(removal), ImagingConfig::default())
}

#[tokio::test]
async fn concurrent_removals_share_one_model_call() {
    let model = Arc::new(CountingModel::default());
    let service =
        BackgroundRemovalService::new(Arc::new(DefaultImageSource::new()), model.clone());
    let url = studio_photo_url();
    let options = RemovalOptions::default();

    let (a, b, c) = tokio::join!(
        service.remove_background(&url, &options),
        service.remove_background(&url, &options),
        service.remove_background(&url, &options),
    );
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());

    // Cached from now on, until cleared.
    service.remove_background(&url, &options).await.unwrap();
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    service.clear_cache();
    service.remove_background(&url, &options).await.unwrap();
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_blends_share_one_model_call() {
    let model = Arc::new(CountingModel::default());
    let blender = blender_with(model.clone());
    let url = studio_photo_url();
    let body = BodyConfig::new(BodyType::Average);
    let options = BlendOptions::default();

    let (first, second) = tokio::join!(
        blender.process_dress(&url, &body, &options),
        blender.process_dress(&url, &body, &options),
    );
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert!(!first.fallback);
    assert_eq!(first.blend_mode, BlendMode::Normal);
    assert_eq!(blender.cached_len(), 1);
}

#[tokio::test]
async fn unreachable_image_yields_uncached_fallback() {
    let blender = blender_with(Arc::new(NoModel));
    let url = "/definitely/missing/dress.png";
    let body = BodyConfig::new(BodyType::Petite);

    let result = blender
        .process_dress(url, &body, &BlendOptions::default())
        .await;
    assert!(result.fallback);
    assert!(!result.processed_image.is_empty());
    assert_eq!(result.processed_image, url);
    assert_eq!(result.original_url, url);
    assert_eq!(result.blend_mode, BlendMode::Multiply);
    assert!((result.positioning.scale - 0.88).abs() < f32::EPSILON);
    assert_eq!(blender.cached_len(), 0);
}

#[tokio::test]
async fn missing_model_still_produces_a_transparent_cutout() {
    let blender = blender_with(Arc::new(NoModel));
    let url = studio_photo_url();
    let result = blender
        .process_dress(&url, &BodyConfig::new(BodyType::Tall), &BlendOptions::default())
        .await;
    assert!(!result.fallback);
    assert!(result.processed_image.starts_with("data:image/png;base64,"));

    let image = decode_rgba(&decode_data_url(&result.processed_image).unwrap()).unwrap();
    assert_eq!(image.dimensions(), (40 + 80, 60 + 80));
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    // padding (40) + original background corner
    assert_eq!(image.get_pixel(41, 41)[3], 0);
    assert_eq!(image.get_pixel(40 + 20, 40 + 30)[3], 255);
}

#[tokio::test]
async fn unusable_model_output_falls_back_to_colour_distance() {
    let service = BackgroundRemovalService::new(
        Arc::new(DefaultImageSource::new()),
        Arc::new(GarbageModel),
    );
    service.preload_model(&RemovalOptions::default()).await;
    let cutout = service
        .remove_background(&studio_photo_url(), &RemovalOptions::default())
        .await
        .unwrap();
    let image = decode_rgba(&decode_data_url(&cutout).unwrap()).unwrap();
    assert_eq!(image.dimensions(), (40, 60));
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(image.get_pixel(20, 30)[3], 255);
}

#[tokio::test]
async fn unenhanced_blend_returns_the_raw_cutout() {
    let model = Arc::new(CountingModel::default());
    let blender = blender_with(model);
    let url = studio_photo_url();
    let options = BlendOptions {
        enhance: false,
        ..BlendOptions::default()
    };
    let result = blender
        .process_dress(&url, &BodyConfig::default(), &options)
        .await;
    // The counting model echoes its input, so the cut-out is the photo itself.
    assert_eq!(result.processed_image, url);
    assert!(!result.fallback);
    blender.clear_cache();
    assert_eq!(blender.cached_len(), 0);
    assert_eq!(blender.removal().cached_len(), 0);
}
