//! Compiled Shader Handles
//!
//! A [`Shader`] pairs a linked program with its reflected uniform table.
//! Pipeline limits (light/shadow counts) are injected as a macro block at
//! compile time and must stay fixed for the pipeline's lifetime; programs
//! are never recompiled mid-frame.

use rustc_hash::FxHashMap;

use crate::device::{GraphicsDevice, ProgramId, UniformInfo, UniformValue};
use crate::errors::Result;

pub struct Shader {
    name: String,
    program: ProgramId,
    uniforms: FxHashMap<String, UniformInfo>,
}

impl Shader {
    /// Compiles and links a program with `macros` injected into both stages,
    /// then reflects its active uniform table. Compile and link failures
    /// carry the shader name and the backend diagnostic.
    pub fn compile<D: GraphicsDevice>(
        device: &mut D,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
        macros: &str,
    ) -> Result<Self> {
        let vertex = inject_macros(vertex_src, macros);
        let fragment = inject_macros(fragment_src, macros);
        let program = device.create_program(name, &vertex, &fragment)?;
        let uniforms = device.program_uniforms(program).into_iter().collect();
        Ok(Self {
            name: name.to_owned(),
            program,
            uniforms,
        })
    }

    /// Wraps an already linked program and its reflected table.
    #[must_use]
    pub fn from_parts(
        name: &str,
        program: ProgramId,
        uniforms: Vec<(String, UniformInfo)>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            program,
            uniforms: uniforms.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[must_use]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms
            .get(name)
            .is_some_and(|info| info.location >= 0)
    }

    pub fn activate<D: GraphicsDevice>(&self, device: &mut D) {
        device.use_program(Some(self.program));
    }

    /// Writes a uniform by name. Names absent from the reflected table (or
    /// optimized out) are skipped silently.
    pub fn set_uniform<D: GraphicsDevice>(
        &self,
        device: &mut D,
        name: &str,
        value: &UniformValue,
    ) {
        if self.has_uniform(name) {
            device.set_uniform(self.program, name, value);
        }
    }

    pub fn delete<D: GraphicsDevice>(&self, device: &mut D) {
        device.delete_program(self.program);
    }
}

/// Inserts the macro block right after the `#version` directive (or in
/// front of everything when there is none).
fn inject_macros(source: &str, macros: &str) -> String {
    if macros.is_empty() {
        return source.to_owned();
    }
    if let Some(line_end) = source.find('\n') {
        if source[..line_end].trim_start().starts_with("#version") {
            let (version, rest) = source.split_at(line_end + 1);
            return format!("{version}{macros}\n{rest}");
        }
    }
    format!("{macros}\n{source}")
}

#[cfg(test)]
mod tests {
    use super::inject_macros;

    #[test]
    fn macros_follow_the_version_directive() {
        let injected = inject_macros(
            "#version 330 core\nvoid main() {}\n",
            "#define MAX_LIGHTS 4",
        );
        let mut lines = injected.lines();
        assert_eq!(lines.next(), Some("#version 330 core"));
        assert_eq!(lines.next(), Some("#define MAX_LIGHTS 4"));
    }

    #[test]
    fn macros_lead_without_a_version_directive() {
        let injected = inject_macros("void main() {}\n", "#define MAX_LIGHTS 4");
        assert!(injected.starts_with("#define MAX_LIGHTS 4\n"));
    }
}
