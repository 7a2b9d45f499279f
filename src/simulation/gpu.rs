//! # GPU Step Engine
//!
//! Runs the transition as a compute kernel over two storage buffers used
//! ping-pong style. Two bind groups are created up front, one per direction
//! (slot 0 -> slot 1 and slot 1 -> slot 0), so swapping roles is just a flag
//! flip and never recreates GPU resources.
//!
//! ## Synchronization
//!
//! A step records the dispatch, submits it, and waits on the device before
//! doing anything else. Only after that wait does the ping-pong flag flip,
//! and only after the flip is the new current buffer copied back to the
//! host store. The next dispatch cannot start before the host store has been
//! swapped, because the frame loop drives everything from one thread.

use std::sync::Arc;

use log::{debug, info, warn};

use super::{
    cell_state::{CellStateStore, GridSize, PingPong},
    rule::{LifeRule, Neighborhood},
    traits::StepEngine,
};
use crate::{
    error::{LifeError, Result},
    gfx::{context::GpuDevice, shader::Shader},
    wgpu_utils::{self, ArrayBuffer, UniformBuffer},
};

/// Work-group edge length, must match `@workgroup_size` in `life_step.wgsl`
pub const WORKGROUP_SIZE: u32 = 8;

const STEP_SHADER: &str = include_str!("life_step.wgsl");

/// Parameter block of the step kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StepParams {
    pub width: u32,
    pub height: u32,
    pub birth: u32,
    pub survive: u32,
    pub neighborhood: u32,
    pub _padding: [u32; 3],
}

impl StepParams {
    pub fn new(size: GridSize, rule: LifeRule, neighborhood: Neighborhood) -> Self {
        Self {
            width: size.width,
            height: size.height,
            birth: rule.birth,
            survive: rule.survive,
            neighborhood: neighborhood.shader_id(),
            _padding: [0; 3],
        }
    }
}

/// Number of work groups needed to cover `size`
pub fn dispatch_size(size: GridSize) -> (u32, u32, u32) {
    (
        size.width.div_ceil(WORKGROUP_SIZE),
        size.height.div_ceil(WORKGROUP_SIZE),
        1,
    )
}

/// Compute-shader implementation of [`StepEngine`]
pub struct GpuStepEngine {
    gpu: GpuDevice,
    size: GridSize,
    pipeline: wgpu::ComputePipeline,
    /// Bound by both bind groups; never rewritten
    _params: UniformBuffer<StepParams>,
    cells: PingPong<ArrayBuffer<u32>>,
    /// `bind_groups[i]` reads slot `i` and writes slot `i ^ 1`
    bind_groups: [wgpu::BindGroup; 2],
    staging: ArrayBuffer<u32>,
    dispatch: (u32, u32, u32),
    next_dirty: bool,
    step_count: u64,
    /// Makes the next dispatch report failure after the kernel has run
    #[cfg(test)]
    fail_next_dispatch: bool,
}

impl GpuStepEngine {
    pub fn new(
        gpu: &GpuDevice,
        size: GridSize,
        rule: LifeRule,
        neighborhood: Neighborhood,
    ) -> Result<Self> {
        let device: &Arc<wgpu::Device> = &gpu.device;
        let limits = device.limits();

        let dispatch = dispatch_size(size);
        let max_groups = limits.max_compute_workgroups_per_dimension;
        let cell_bytes = size.cell_count() as u64 * std::mem::size_of::<u32>() as u64;
        if dispatch.0 > max_groups
            || dispatch.1 > max_groups
            || cell_bytes > limits.max_storage_buffer_binding_size as u64
        {
            warn!(
                "Grid {}x{} exceeds device compute limits",
                size.width, size.height
            );
            return Err(LifeError::InvalidDimension {
                width: size.width,
                height: size.height,
            });
        }

        let shader = Shader::compute(device, "life_step.wgsl", STEP_SHADER)?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Life Step Bind Group Layout"),
            entries: &[
                wgpu_utils::layout_entry(
                    0,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu_utils::uniform(),
                ),
                wgpu_utils::layout_entry(
                    1,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu_utils::storage_buffer_read_only(),
                ),
                wgpu_utils::layout_entry(
                    2,
                    wgpu::ShaderStages::COMPUTE,
                    wgpu_utils::storage_buffer_read_write(),
                ),
            ],
        });
        let pipeline = shader.compute_pipeline(device, &[&layout])?;

        let params = UniformBuffer::new_with_data(device, &StepParams::new(size, rule, neighborhood));

        let cell_usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        let cells = PingPong::new(
            ArrayBuffer::new(device, "Cell Buffer A", size.cell_count(), cell_usage),
            ArrayBuffer::new(device, "Cell Buffer B", size.cell_count(), cell_usage),
        );

        let bind_group = |read: &ArrayBuffer<u32>, write: &ArrayBuffer<u32>, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params.binding_resource(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: read.binding_resource(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: write.binding_resource(),
                    },
                ],
            })
        };
        // Slot 0 is current right after construction
        let a_to_b = bind_group(cells.current(), cells.next(), "Life Step A->B");
        let b_to_a = bind_group(cells.next(), cells.current(), "Life Step B->A");

        let staging = ArrayBuffer::new_staging(device, size.cell_count());

        info!(
            "GPU step engine ready: {}x{} cells, {}x{} work groups, rule {}",
            size.width, size.height, dispatch.0, dispatch.1, rule
        );

        Ok(Self {
            gpu: gpu.clone(),
            size,
            pipeline,
            _params: params,
            cells,
            bind_groups: [a_to_b, b_to_a],
            staging,
            dispatch,
            next_dirty: false,
            step_count: 0,
            #[cfg(test)]
            fail_next_dispatch: false,
        })
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    fn check_size(&self, store: &CellStateStore) -> Result<()> {
        if store.size() != self.size {
            return Err(LifeError::SizeMismatch {
                expected: self.size.cell_count(),
                actual: store.size().cell_count(),
            });
        }
        Ok(())
    }

    /// Records and submits one dispatch, then waits for it to finish.
    fn dispatch(&mut self) -> Result<()> {
        let device = &self.gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Life Step Encoder"),
        });

        if self.next_dirty {
            encoder.clear_buffer(self.cells.next().buffer(), 0, None);
        }

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Life Step Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_groups[self.cells.current_slot()], &[]);
            compute_pass.dispatch_workgroups(self.dispatch.0, self.dispatch.1, self.dispatch.2);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        let scope = pollster::block_on(device.pop_error_scope());
        let polled = device.poll(wgpu::PollType::Wait);

        if let Some(error) = scope {
            return Err(LifeError::DispatchFailure(error.to_string()));
        }
        polled.map_err(|e| LifeError::DispatchFailure(e.to_string()))?;

        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_dispatch) {
            return Err(LifeError::DispatchFailure("forced failure".to_string()));
        }
        Ok(())
    }
}

impl StepEngine for GpuStepEngine {
    fn name(&self) -> &str {
        "gpu"
    }

    fn upload(&mut self, store: &CellStateStore) -> Result<()> {
        self.check_size(store)?;
        let slot = self.cells.current_slot();
        self.cells.current_mut().update_data(&self.gpu.queue, store.current())?;
        self.next_dirty = true;
        debug!(
            "Uploaded {} live cells to GPU slot {}",
            store.live_count(),
            slot
        );
        Ok(())
    }

    fn step(&mut self, store: &mut CellStateStore) -> Result<()> {
        self.check_size(store)?;

        if let Err(e) = self.dispatch() {
            self.next_dirty = true;
            return Err(e);
        }
        self.next_dirty = false;
        self.cells.swap();

        let cells = match self
            .staging
            .read_back(&self.gpu.device, &self.gpu.queue, self.cells.current().buffer())
        {
            Ok(cells) => cells,
            Err(e) => {
                // Keep GPU and host in agreement: the generation is discarded
                self.cells.swap();
                self.next_dirty = true;
                return Err(e);
            }
        };

        store.load_next(&cells)?;
        store.swap();
        self.step_count += 1;
        Ok(())
    }

    fn drain(&mut self) {
        self.gpu.wait_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::cpu::CpuStepEngine;

    fn gpu() -> Option<GpuDevice> {
        match pollster::block_on(GpuDevice::headless()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    #[test]
    fn test_dispatch_covers_partial_tiles() {
        assert_eq!(dispatch_size(GridSize::new(8, 8).unwrap()), (1, 1, 1));
        assert_eq!(dispatch_size(GridSize::new(9, 17).unwrap()), (2, 3, 1));
        assert_eq!(dispatch_size(GridSize::new(1, 1).unwrap()), (1, 1, 1));
    }

    #[test]
    fn test_params_layout_is_uniform_compatible() {
        assert_eq!(std::mem::size_of::<StepParams>(), 32);
        let params = StepParams::new(
            GridSize::new(3, 4).unwrap(),
            LifeRule::CONWAY,
            Neighborhood::VonNeumann,
        );
        assert_eq!(params.birth, 0b1000);
        assert_eq!(params.survive, 0b1100);
        assert_eq!(params.neighborhood, 1);
    }

    #[test]
    fn test_gpu_single_cell_dies() {
        let Some(gpu) = gpu() else { return };
        let mut store = CellStateStore::initialize(5, 5, &[(2, 2)]).unwrap();
        let mut engine = GpuStepEngine::new(
            &gpu,
            store.size(),
            LifeRule::CONWAY,
            Neighborhood::Moore,
        )
        .unwrap();
        engine.upload(&store).unwrap();

        engine.step(&mut store).unwrap();
        assert!(store.current().iter().all(|&c| c == 0));
        assert_eq!(engine.step_count(), 1);
    }

    #[test]
    fn test_gpu_matches_cpu_reference() {
        let Some(gpu) = gpu() else { return };
        let seed = [
            (1, 0),
            (2, 1),
            (0, 2),
            (1, 2),
            (2, 2),
            (10, 10),
            (11, 10),
            (12, 10),
            (0, 19),
            (19, 19),
            (19, 0),
        ];
        let mut gpu_store = CellStateStore::initialize(20, 20, &seed).unwrap();
        let mut cpu_store = CellStateStore::initialize(20, 20, &seed).unwrap();

        let mut gpu_engine = GpuStepEngine::new(
            &gpu,
            gpu_store.size(),
            LifeRule::CONWAY,
            Neighborhood::Moore,
        )
        .unwrap();
        gpu_engine.upload(&gpu_store).unwrap();
        let mut cpu_engine = CpuStepEngine::new(LifeRule::CONWAY, Neighborhood::Moore);

        for generation in 0..12 {
            gpu_engine.step(&mut gpu_store).unwrap();
            cpu_engine.step(&mut cpu_store).unwrap();
            assert_eq!(
                gpu_store.current(),
                cpu_store.current(),
                "diverged at generation {generation}"
            );
        }
    }

    #[test]
    fn test_gpu_rejects_mismatched_store() {
        let Some(gpu) = gpu() else { return };
        let mut engine = GpuStepEngine::new(
            &gpu,
            GridSize::new(4, 4).unwrap(),
            LifeRule::CONWAY,
            Neighborhood::Moore,
        )
        .unwrap();
        let mut store = CellStateStore::initialize(5, 4, &[(1, 1)]).unwrap();
        assert!(engine.step(&mut store).is_err());
        assert!(store.read(1, 1).unwrap());
    }

    #[test]
    fn test_gpu_neighbors_wrap_around_corners() {
        let Some(gpu) = gpu() else { return };
        // (0, 0) sees all three across the edges and is born
        let mut store = CellStateStore::initialize(5, 5, &[(4, 4), (4, 0), (0, 4)]).unwrap();
        let mut engine = GpuStepEngine::new(
            &gpu,
            store.size(),
            LifeRule::CONWAY,
            Neighborhood::Moore,
        )
        .unwrap();
        engine.upload(&store).unwrap();

        engine.step(&mut store).unwrap();
        assert!(store.read(0, 0).unwrap());
        assert!(store.read(4, 4).unwrap());
        assert!(store.read(4, 0).unwrap());
        assert!(store.read(0, 4).unwrap());
        assert_eq!(store.live_count(), 4);
    }

    #[test]
    fn test_gpu_failed_dispatch_keeps_state_and_recovers() {
        let Some(gpu) = gpu() else { return };
        let seed = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
        let mut store = CellStateStore::initialize(8, 8, &seed).unwrap();
        let mut reference = CellStateStore::initialize(8, 8, &seed).unwrap();
        let mut engine = GpuStepEngine::new(
            &gpu,
            store.size(),
            LifeRule::CONWAY,
            Neighborhood::Moore,
        )
        .unwrap();
        engine.upload(&store).unwrap();
        let mut cpu_engine = CpuStepEngine::new(LifeRule::CONWAY, Neighborhood::Moore);

        let slot = engine.cells.current_slot();
        let host_slot = store.current_slot();
        engine.fail_next_dispatch = true;
        assert!(matches!(
            engine.step(&mut store),
            Err(LifeError::DispatchFailure(_))
        ));
        assert!(engine.next_dirty);
        assert_eq!(engine.cells.current_slot(), slot);
        assert_eq!(store.current_slot(), host_slot);
        assert_eq!(store.current(), reference.current());
        assert_eq!(engine.step_count(), 0);

        for generation in 0..4 {
            engine.step(&mut store).unwrap();
            cpu_engine.step(&mut reference).unwrap();
            assert_eq!(
                store.current(),
                reference.current(),
                "diverged at generation {generation}"
            );
        }
        assert!(!engine.next_dirty);
        assert_eq!(engine.step_count(), 4);
    }
}
