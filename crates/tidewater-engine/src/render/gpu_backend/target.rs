/// Size and formats of the offscreen frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetConfig {
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color and depth attachments every frame renders into.
pub struct OffscreenTarget {
    config: TargetConfig,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl OffscreenTarget {
    pub(super) fn new(device: &wgpu::Device, config: TargetConfig) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tidewater color target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tidewater depth target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            config,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            _depth: depth,
        }
    }

    #[inline]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// Final image of the last completed frame.
    #[inline]
    pub fn color(&self) -> &wgpu::Texture {
        &self.color
    }

    #[inline]
    pub(super) fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    #[inline]
    pub(super) fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }
}
