//! # Frame Renderer
//!
//! Draws the static gridlines and then the live-cell quads into the current
//! swapchain texture. There is no depth buffer; draw order alone keeps the
//! cells on top of the grid.

use std::iter;

use log::trace;
use wgpu::util::DeviceExt;

use super::{
    context::GraphicsContext,
    geometry::{GridLineMesh, LiveCellMesh, Vertex2D},
    shader::{RenderTarget, Shader},
    view::{grid_transform, DrawUniform},
};
use crate::{
    error::{LifeError, Result},
    simulation::cell_state::GridSize,
    wgpu_utils::{self, ArrayBuffer, UniformBuffer},
};

const GRID_SHADER: &str = include_str!("grid.wgsl");

/// Colors used for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: [f32; 4],
    pub grid: [f32; 4],
    pub cell: [f32; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [0.85, 0.85, 0.85, 1.0],
            grid: [0.6, 0.6, 0.6, 1.0],
            cell: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

/// A uniform buffer together with the bind group that exposes it
struct DrawBinding {
    uniform: UniformBuffer<DrawUniform>,
    bind_group: wgpu::BindGroup,
}

impl DrawBinding {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        content: DrawUniform,
        label: &str,
    ) -> Self {
        let uniform = UniformBuffer::new_with_data(device, &content);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.binding_resource(),
            }],
        });
        Self {
            uniform,
            bind_group,
        }
    }
}

/// Bytes of the (vertex, index) buffers needed when every cell is alive
pub fn cell_buffer_bytes(size: GridSize) -> (u64, u64) {
    let cells = size.cell_count() as u64;
    let vertex_bytes = cells * 4 * std::mem::size_of::<Vertex2D>() as u64;
    let index_bytes = cells * 6 * std::mem::size_of::<u32>() as u64;
    (vertex_bytes, index_bytes)
}

fn check_cell_buffer_limit(size: GridSize, max_buffer_size: u64) -> Result<()> {
    let (vertex_bytes, index_bytes) = cell_buffer_bytes(size);
    if vertex_bytes.max(index_bytes) > max_buffer_size {
        return Err(LifeError::InvalidDimension {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

pub struct FrameRenderer {
    size: GridSize,
    palette: Palette,

    line_pipeline: wgpu::RenderPipeline,
    cell_pipeline: wgpu::RenderPipeline,

    grid_vertices: wgpu::Buffer,
    grid_vertex_count: u32,

    cell_vertices: ArrayBuffer<Vertex2D>,
    cell_indices: ArrayBuffer<u32>,
    cell_index_count: u32,

    grid_draw: DrawBinding,
    cell_draw: DrawBinding,
}

impl FrameRenderer {
    pub fn new(context: &GraphicsContext, grid: &GridLineMesh, palette: Palette) -> Result<Self> {
        let device = context.device();
        let size = grid.size();

        let shader = Shader::vertex_fragment(device, "grid.wgsl", GRID_SHADER)?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Grid Draw Bind Group Layout"),
            entries: &[wgpu_utils::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                wgpu_utils::uniform(),
            )],
        });

        let vertex_layouts = [Vertex2D::desc()];
        let pipeline = |topology| {
            shader.render_pipeline(
                device,
                &[&layout],
                RenderTarget {
                    vertex_buffers: &vertex_layouts,
                    topology,
                    format: context.surface_format(),
                },
            )
        };
        let line_pipeline = pipeline(wgpu::PrimitiveTopology::LineList)?;
        let cell_pipeline = pipeline(wgpu::PrimitiveTopology::TriangleList)?;

        let grid_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Line Vertex Buffer"),
            contents: bytemuck::cast_slice(grid.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Worst case: every cell alive
        let cells = size.cell_count();
        check_cell_buffer_limit(size, device.limits().max_buffer_size)?;
        let cell_vertices = ArrayBuffer::new(
            device,
            "Live Cell Vertices",
            cells * 4,
            wgpu::BufferUsages::VERTEX,
        );
        let cell_indices = ArrayBuffer::new(
            device,
            "Live Cell Indices",
            cells * 6,
            wgpu::BufferUsages::INDEX,
        );

        let (width, height) = context.size();
        let transform = grid_transform(size.width, size.height, width, height);
        let grid_draw = DrawBinding::new(
            device,
            &layout,
            DrawUniform::new(transform, palette.grid),
            "Grid Line Bind Group",
        );
        let cell_draw = DrawBinding::new(
            device,
            &layout,
            DrawUniform::new(transform, palette.cell),
            "Live Cell Bind Group",
        );

        Ok(Self {
            size,
            palette,
            line_pipeline,
            cell_pipeline,
            grid_vertices,
            grid_vertex_count: grid.vertex_count(),
            cell_vertices,
            cell_indices,
            cell_index_count: 0,
            grid_draw,
            cell_draw,
        })
    }

    /// Replaces the live-cell geometry drawn by subsequent frames
    pub fn upload_cells(&mut self, queue: &wgpu::Queue, mesh: &LiveCellMesh) -> Result<()> {
        self.cell_vertices.update_data(queue, mesh.vertices())?;
        self.cell_indices.update_data(queue, mesh.indices())?;
        self.cell_index_count = mesh.index_count();
        Ok(())
    }

    /// Rebuilds the view transform after the surface changed size
    pub fn resize(&mut self, queue: &wgpu::Queue, width: u32, height: u32) {
        let transform = grid_transform(self.size.width, self.size.height, width, height);
        self.grid_draw
            .uniform
            .update_content(queue, DrawUniform::new(transform, self.palette.grid));
        self.cell_draw
            .uniform
            .update_content(queue, DrawUniform::new(transform, self.palette.cell));
    }

    pub fn cell_index_count(&self) -> u32 {
        self.cell_index_count
    }

    /// Draws grid then cells and presents. A skipped frame is not an error.
    pub fn render(&self, context: &mut GraphicsContext) -> Result<()> {
        let Some(frame) = context.acquire_frame()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = self.palette.background.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_bind_group(0, &self.grid_draw.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.grid_vertices.slice(..));
            render_pass.draw(0..self.grid_vertex_count, 0..1);

            if self.cell_index_count > 0 {
                render_pass.set_pipeline(&self.cell_pipeline);
                render_pass.set_bind_group(0, &self.cell_draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.cell_vertices.buffer().slice(..));
                render_pass.set_index_buffer(
                    self.cell_indices.buffer().slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..self.cell_index_count, 0, 0..1);
            }
        }

        context.queue().submit(iter::once(encoder.finish()));
        frame.present();
        trace!("Presented frame with {} cell indices", self.cell_index_count);
        Ok(())
    }
}
