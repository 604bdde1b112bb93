//! Invokes the system linker (via `cc`) to combine an emitted object file
//! with the runtime library into an executable (§6: the default CLI mode's
//! final step, producing `a.out`).

use std::path::Path;
use std::process::Command;

use crate::error::{CodeGenError, Result};

pub struct Linker {
    target_triple: String,
}

impl Linker {
    pub fn new(target_triple: String) -> Self {
        Self { target_triple }
    }

    /// Links `object` against `libllpc_runtime` found under
    /// `runtime_lib_dir`, producing `output`.
    pub fn link(&self, object: &Path, output: &Path, runtime_lib_dir: &Path) -> Result<()> {
        let status = Command::new("cc")
            .arg(object)
            .arg("-o")
            .arg(output)
            .arg("-L")
            .arg(runtime_lib_dir)
            .arg("-lllpc_runtime")
            .arg("-lm")
            .status()
            .map_err(|e| CodeGenError::CompilationError(format!("failed to invoke linker: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(CodeGenError::CompilationError(format!(
                "linker exited with status {status} (target {})",
                self.target_triple
            )))
        }
    }
}
