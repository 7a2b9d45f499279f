//! # Shader Programs
//!
//! A [`Shader`] is a validated WGSL module plus the recipe for turning it
//! into a pipeline. The two kinds differ only in how they are linked:
//! a compute shader becomes a compute pipeline with one entry point, a
//! vertex/fragment shader becomes a render pipeline with two.
//!
//! wgpu reports invalid shaders and pipelines asynchronously, so compile and
//! link both run inside a validation error scope and any captured error is
//! returned as [`LifeError::CompileOrLinkFailure`] naming the shader.

use log::debug;

use crate::error::{LifeError, Result};

/// Entry points by shader kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Compute {
        entry_point: &'static str,
    },
    VertexFragment {
        vertex_entry: &'static str,
        fragment_entry: &'static str,
    },
}

/// Fixed-function state for a render pipeline built from a vertex/fragment shader
pub struct RenderTarget<'a> {
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub format: wgpu::TextureFormat,
}

/// Compiled shader module
pub struct Shader {
    label: String,
    kind: ShaderKind,
    module: wgpu::ShaderModule,
}

impl Shader {
    /// Single-stage compute shader with entry point `main`
    pub fn compute(device: &wgpu::Device, label: &str, source: &str) -> Result<Self> {
        Self::compile(
            device,
            label,
            source,
            ShaderKind::Compute {
                entry_point: "main",
            },
        )
    }

    /// Two-stage shader with entry points `vs_main` and `fs_main`
    pub fn vertex_fragment(device: &wgpu::Device, label: &str, source: &str) -> Result<Self> {
        Self::compile(
            device,
            label,
            source,
            ShaderKind::VertexFragment {
                vertex_entry: "vs_main",
                fragment_entry: "fs_main",
            },
        )
    }

    fn compile(device: &wgpu::Device, label: &str, source: &str, kind: ShaderKind) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        check_scope(device, label)?;

        debug!("Compiled shader '{}' ({:?})", label, kind);
        Ok(Self {
            label: label.to_string(),
            kind,
            module,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    fn wrong_kind(&self, wanted: &str) -> LifeError {
        LifeError::CompileOrLinkFailure {
            label: self.label.clone(),
            message: format!("cannot build a {wanted} pipeline from a {:?} shader", self.kind),
        }
    }

    /// Links a compute pipeline using `layouts` as bind groups 0..n
    pub fn compute_pipeline(
        &self,
        device: &wgpu::Device,
        layouts: &[&wgpu::BindGroupLayout],
    ) -> Result<wgpu::ComputePipeline> {
        let ShaderKind::Compute { entry_point } = self.kind else {
            return Err(self.wrong_kind("compute"));
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", self.label)),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&format!("{} Pipeline", self.label)),
            layout: Some(&layout),
            module: &self.module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        });
        check_scope(device, &self.label)?;
        Ok(pipeline)
    }

    /// Links a render pipeline writing one color target with replace blending
    pub fn render_pipeline(
        &self,
        device: &wgpu::Device,
        layouts: &[&wgpu::BindGroupLayout],
        target: RenderTarget<'_>,
    ) -> Result<wgpu::RenderPipeline> {
        let ShaderKind::VertexFragment {
            vertex_entry,
            fragment_entry,
        } = self.kind
        else {
            return Err(self.wrong_kind("render"));
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", self.label)),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} {:?} Pipeline", self.label, target.topology)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(vertex_entry),
                buffers: target.vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: target.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        check_scope(device, &self.label)?;
        Ok(pipeline)
    }
}

/// Pops the validation scope pushed by the caller
fn check_scope(device: &wgpu::Device, label: &str) -> Result<()> {
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(()),
        Some(error) => Err(LifeError::CompileOrLinkFailure {
            label: label.to_string(),
            message: error.to_string(),
        }),
    }
}
