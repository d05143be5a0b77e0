//! Render pipeline management system for wgpu
//!
//! Pipelines are registered by name and built together once the shaders are loaded.

use std::{collections::HashMap, sync::Arc};

use wgpu::*;

/// Blend that adds source colour weighted by its alpha onto the target, so
/// overlapping sprites brighten instead of occluding one another.
pub const ADDITIVE_BLENDING: BlendState = BlendState {
    color: BlendComponent {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::One,
        operation: BlendOperation::Add,
    },
    alpha: BlendComponent {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::One,
        operation: BlendOperation::Add,
    },
};

/// Configuration for creating a render pipeline
///
/// Defines all parameters needed to create a wgpu render pipeline,
/// including shaders, bind group layouts, vertex layouts and blend state.
/// Pipelines built here never carry a depth attachment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_buffers: Vec<VertexBufferLayout<'static>>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "shader.wgsl".to_string(),
            bind_group_layouts: Vec::new(),
            vertex_buffers: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Sets the shader for this pipeline (builder pattern)
    ///
    /// # Arguments
    /// * `shader` - Shader identifier
    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    /// Sets all bind group layouts at once (builder pattern)
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_buffers(mut self, layouts: Vec<VertexBufferLayout<'static>>) -> Self {
        self.vertex_buffers = layouts;
        self
    }

    /// Single colour target of `format` using `blend`.
    pub fn with_blended_target(mut self, format: TextureFormat, blend: BlendState) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(blend),
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    /// Sets primitive topology for this pipeline (builder pattern)
    ///
    /// # Arguments
    /// * `topology` - Primitive topology (TriangleList, LineList, etc.)
    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }
}

/// Named render pipelines built from registered configurations
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    /// Creates a new pipeline manager
    ///
    /// # Arguments
    /// * `device` - Shared wgpu device for creating resources
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Registers a pipeline configuration without creating it.
    /// `create_all_pipelines()` builds every registered pipeline.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
    }

    /// Loads and compiles a WGSL shader module under `name`
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Returns a pipeline created by `create_all_pipelines()`
    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates every registered pipeline that does not exist yet
    ///
    /// # Returns
    /// Result with vector of error messages if any pipelines failed to create
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let missing = uncreated_names(self.pipeline_configs.keys(), |name| {
            self.pipelines.contains_key(name)
        });

        for name in missing {
            let Some(config) = self.pipeline_configs.get(&name).cloned() else {
                continue;
            };
            match self.create_pipeline_from_config(&name, &config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => errors.push(format!("Pipeline '{}': {}", name, e)),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a render pipeline from configuration
    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, String> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| format!("Shader '{}' not found", config.shader))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &config.vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }
}

/// Registered names with no pipeline yet, sorted for a stable build order.
fn uncreated_names<'a, I, F>(registered: I, is_created: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
    F: Fn(&str) -> bool,
{
    let mut names: Vec<String> = registered
        .into_iter()
        .filter(|name| !is_created(name))
        .cloned()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_blended_target() {
        let config = PipelineConfig::default()
            .with_label("points")
            .with_shader("glow")
            .with_primitive_topology(PrimitiveTopology::LineList)
            .with_blended_target(TextureFormat::Rgba8Unorm, ADDITIVE_BLENDING);

        assert_eq!(config.label, "points");
        assert_eq!(config.shader, "glow");
        assert_eq!(config.primitive_topology, PrimitiveTopology::LineList);
        let target = config.color_targets[0].as_ref().unwrap();
        assert_eq!(target.format, TextureFormat::Rgba8Unorm);
        assert_eq!(target.blend, Some(ADDITIVE_BLENDING));
    }

    #[test]
    fn only_uncreated_pipelines_are_built_in_name_order() {
        let registered = [
            "lines".to_string(),
            "glow".to_string(),
            "debug".to_string(),
        ];

        let all = uncreated_names(&registered, |_| false);
        assert_eq!(all, vec!["debug", "glow", "lines"]);

        let remaining = uncreated_names(&registered, |name| name == "glow");
        assert_eq!(remaining, vec!["debug", "lines"]);

        assert!(uncreated_names(&registered, |_| true).is_empty());
    }
}
