//! Shader binary registry.

use crate::artifact::schema::Model;

#[derive(Debug, Clone)]
pub struct ShaderBinary {
    pub name: String,
    pub spirv: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ShaderRegistry {
    pub binaries: Vec<ShaderBinary>,
}

impl ShaderRegistry {
    /// Names are stable across reruns: `comp<i>` in artifact order.
    pub fn build(model: &Model) -> ShaderRegistry {
        let binaries = model
            .shader_binaries
            .iter()
            .enumerate()
            .map(|(i, bin)| ShaderBinary {
                name: format!("comp{i}"),
                spirv: bin.spirv.clone(),
            })
            .collect();
        ShaderRegistry { binaries }
    }
}
