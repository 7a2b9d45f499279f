//! # Graphics Context
//!
//! Owns every wgpu handle the application needs (instance, surface, adapter,
//! device, queue) and is passed explicitly to whoever records GPU work.
//! [`GpuDevice`] is the device/queue half on its own, which is all the step
//! engine needs and which can also be created without a window.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{LifeError, Result};

/// Shared device and queue
#[derive(Clone)]
pub struct GpuDevice {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuDevice {
    async fn from_adapter(adapter: &wgpu::Adapter) -> Result<Self> {
        let adapter_info = adapter.get_info();
        info!(
            "Using adapter '{}' ({:?}, {:?})",
            adapter_info.name, adapter_info.backend, adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Lifegrid Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| LifeError::Device(e.to_string()))?;

        let gpu = Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        };
        gpu.log_compute_limits();
        Ok(gpu)
    }

    /// Device with no surface, for offscreen compute
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| LifeError::Adapter(e.to_string()))?;
        Self::from_adapter(&adapter).await
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Logs the work-group limits that bound how large a grid one dispatch can cover
    pub fn log_compute_limits(&self) {
        let limits = self.device.limits();
        debug!("Compute limits:");
        debug!(
            "  max workgroups per dimension: {}",
            limits.max_compute_workgroups_per_dimension
        );
        debug!(
            "  max workgroup size: {} x {} x {}",
            limits.max_compute_workgroup_size_x,
            limits.max_compute_workgroup_size_y,
            limits.max_compute_workgroup_size_z
        );
        debug!(
            "  max invocations per workgroup: {}",
            limits.max_compute_invocations_per_workgroup
        );
        debug!(
            "  max storage buffer binding: {} bytes",
            limits.max_storage_buffer_binding_size
        );
    }

    /// Blocks until all submitted work has finished
    pub fn wait_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Wait) {
            warn!("Device poll failed while draining: {e}");
        }
    }
}

/// Window-bound graphics state
pub struct GraphicsContext {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    gpu: GpuDevice,
}

impl GraphicsContext {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| LifeError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| LifeError::Adapter(e.to_string()))?;

        let gpu = GpuDevice::from_adapter(&adapter).await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| LifeError::Surface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_capabilities
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        info!("Surface configured: {}x{} {:?}", config.width, config.height, format);

        Ok(Self {
            surface,
            config,
            gpu,
        })
    }

    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.gpu.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.gpu.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the surface; zero-sized requests (minimised window) are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.gpu.device, &self.config);
    }

    /// Next swapchain texture.
    ///
    /// Returns `Ok(None)` when the frame should simply be skipped (timeout,
    /// or a lost/outdated surface that was reconfigured).
    pub fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.gpu.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Skipping frame due to surface timeout");
                Ok(None)
            }
            Err(e) => Err(LifeError::Surface(e.to_string())),
        }
    }
}
