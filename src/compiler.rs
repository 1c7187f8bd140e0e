//! Schema Compiler Wrapper
//!
//! Runs `protoc` against a single schema file, with the include root detected
//! by [`RootResolver`], and decodes the resulting descriptor set.
//!
//! ```text
//! protoc --proto_path=<root> [--proto_path=<extra>...] --include_imports \
//!        --descriptor_set_out=<tmp>/descriptor_set.pb <file>
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ExplorerConfig;
use crate::descriptor::DescriptorPool;
use crate::error::{ExplorerError, Result};
use crate::resolver::RootResolver;

const DESCRIPTOR_SET_NAME: &str = "descriptor_set.pb";

/// Output of a successful compilation
#[derive(Debug)]
pub struct CompiledModule {
    /// Canonical path of the compiled schema file
    pub file: PathBuf,
    /// Include root passed as the first `--proto_path`
    pub root: PathBuf,
    pub pool: DescriptorPool,
}

/// Invokes the external schema compiler
#[derive(Debug, Clone)]
pub struct ProtocCompiler {
    program: String,
    include_paths: Vec<PathBuf>,
    include_imports: bool,
    resolver: RootResolver,
}

impl Default for ProtocCompiler {
    fn default() -> Self {
        Self::from_config(&ExplorerConfig::default())
    }
}

impl ProtocCompiler {
    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self {
            program: config.compiler.program.clone(),
            include_paths: config.compiler.include_paths.clone(),
            include_imports: config.compiler.include_imports,
            resolver: RootResolver::from_config(&config.resolver),
        }
    }

    /// Arguments passed to the compiler, in order
    pub fn command_args(&self, file: &Path, root: &Path, descriptor_out: &Path) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.include_paths.len() + 4);
        args.push(proto_path_arg(root));
        for include in &self.include_paths {
            args.push(proto_path_arg(include));
        }
        if self.include_imports {
            args.push(OsString::from("--include_imports"));
        }
        let mut out = OsString::from("--descriptor_set_out=");
        out.push(descriptor_out);
        args.push(out);
        args.push(file.as_os_str().to_os_string());
        args
    }

    /// Detect the include root, then compile
    pub fn compile(&self, file: &Path) -> Result<CompiledModule> {
        let root = self.resolver.resolve(file)?;
        self.compile_with_root(file, &root)
    }

    /// Compile against a known include root
    pub fn compile_with_root(&self, file: &Path, root: &Path) -> Result<CompiledModule> {
        if !file.exists() {
            return Err(ExplorerError::NotFound {
                path: file.to_path_buf(),
            });
        }
        let file = fs::canonicalize(file)?;

        let scratch = tempfile::Builder::new()
            .prefix("protoexplorer_gen_")
            .tempdir()?;
        let descriptor_out = scratch.path().join(DESCRIPTOR_SET_NAME);
        let args = self.command_args(&file, root, &descriptor_out);

        tracing::info!(file = %file.display(), root = %root.display(), "compiling schema");
        tracing::debug!(program = %self.program, ?args, "compiler command");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ExplorerError::CompilerUnavailable {
                    program: self.program.clone(),
                    source,
                },
                _ => ExplorerError::Io(source),
            })?;

        if !output.status.success() {
            return Err(ExplorerError::Compile {
                file,
                code: output.status.code(),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = fs::read(&descriptor_out)?;
        let pool = DescriptorPool::from_bytes(&bytes)?;
        tracing::debug!(messages = pool.message_count(), "compilation succeeded");

        Ok(CompiledModule {
            file,
            root: root.to_path_buf(),
            pool,
        })
    }
}

fn proto_path_arg(dir: &Path) -> OsString {
    let mut arg = OsString::from("--proto_path=");
    arg.push(dir);
    arg
}
