//! Explorer Facade
//!
//! Ties configuration, root resolution, compilation, the descriptor cache and
//! rendering together for front ends (the CLI, or any other display layer).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::ProtocCompiler;
use crate::config::ExplorerConfig;
use crate::descriptor::{DescriptorCache, DescriptorPool, ModuleKey};
use crate::error::{ExplorerError, Result};
use crate::resolver::RootResolver;
use crate::search::{RenderOutput, Renderer, SearchPattern, TextFormatter};

/// Result of a render request
#[derive(Debug)]
pub struct RenderReport {
    /// Full name of the rendered message
    pub message: String,
    pub output: RenderOutput,
    /// The pattern in effect (absent when none was given or it was invalid)
    pub pattern: Option<SearchPattern>,
    /// Set when the supplied pattern was malformed and the render fell back
    /// to no pattern
    pub pattern_error: Option<ExplorerError>,
}

/// Stateful entry point holding the descriptor cache
pub struct Explorer {
    config: ExplorerConfig,
    resolver: RootResolver,
    compiler: ProtocCompiler,
    cache: DescriptorCache,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            resolver: RootResolver::from_config(&config.resolver),
            compiler: ProtocCompiler::from_config(&config),
            cache: DescriptorCache::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Include root for a schema file
    pub fn resolve_root(&self, schema_file: &Path) -> Result<PathBuf> {
        self.resolver.resolve(schema_file)
    }

    /// Compile a schema file (once per file and detected root)
    pub fn load_schema(&mut self, schema_file: &Path) -> Result<Arc<DescriptorPool>> {
        let root = self.resolver.resolve(schema_file)?;
        let file = fs::canonicalize(schema_file)?;
        let key = ModuleKey::new(file, Some(&root));

        let compiler = &self.compiler;
        self.cache.get_or_try_load(key, |key| {
            compiler
                .compile_with_root(&key.module, &root)
                .map(|compiled| compiled.pool)
        })
    }

    /// Load a prebuilt descriptor set (once per path)
    pub fn load_descriptor_set(&mut self, path: &Path) -> Result<Arc<DescriptorPool>> {
        if !path.exists() {
            return Err(ExplorerError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let key = ModuleKey::new(fs::canonicalize(path)?, None);
        self.cache
            .get_or_try_load(key, |key| DescriptorPool::from_file(&key.module))
    }

    /// Render a message selected by `query`.
    ///
    /// An empty `pattern` means no search. A malformed pattern does not fail
    /// the render: it is reported in [`RenderReport::pattern_error`] and the
    /// tree is rendered unfiltered and unhighlighted. `filter_mode` defaults
    /// to the configured value.
    pub fn render(
        &self,
        pool: &DescriptorPool,
        query: &str,
        pattern: &str,
        filter_mode: Option<bool>,
    ) -> Result<RenderReport> {
        let message = pool.require(query)?;

        let (pattern, pattern_error) = match SearchPattern::compile(pattern) {
            Ok(pattern) => (pattern, None),
            Err(err) => {
                tracing::warn!(error = %err, "invalid search pattern, rendering without it");
                (None, Some(err))
            }
        };

        let filter_mode = filter_mode.unwrap_or(self.config.render.filter_mode);
        let output = Renderer::new(pool)
            .with_pattern(pattern.as_ref())
            .with_filter(filter_mode)
            .with_repeated_marker(&self.config.render.repeated_marker)
            .render(message);

        Ok(RenderReport {
            message: message.full_name.clone(),
            output,
            pattern,
            pattern_error,
        })
    }

    /// Text rendering of a report using the configured indentation and markers
    pub fn format_text(&self, report: &RenderReport) -> String {
        TextFormatter::new(&self.config.render, report.pattern.as_ref()).format(&report.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::fixtures;
    use prost::Message;

    #[test]
    fn test_render_with_invalid_pattern_falls_back() {
        let explorer = Explorer::default();
        let pool = fixtures::shop_pool();

        let report = explorer.render(&pool, "Order", "items(", Some(true)).unwrap();
        assert!(matches!(report.pattern_error, Some(ExplorerError::Pattern(_))));
        assert!(report.pattern.is_none());
        assert_eq!(report.message, "shop.Order");
        // unfiltered: every regular message field is present
        assert!(report.output.contains_text("customer: shop.Customer"));
        assert!(report.output.lines.iter().all(|l| !l.is_match));
    }

    #[test]
    fn test_render_unknown_message() {
        let explorer = Explorer::default();
        let pool = fixtures::shop_pool();
        let err = explorer.render(&pool, "Nope", "", None).unwrap_err();
        assert!(matches!(err, ExplorerError::UnknownMessage { .. }));
    }

    #[test]
    fn test_filter_mode_defaults_to_config() {
        let mut config = ExplorerConfig::default();
        config.render.filter_mode = true;
        let explorer = Explorer::new(config);
        let pool = fixtures::shop_pool();

        let report = explorer.render(&pool, "shop.Order", "^sku", None).unwrap();
        assert!(!report.output.contains_text("customer: shop.Customer"));

        let unfiltered = explorer.render(&pool, "shop.Order", "^sku", Some(false)).unwrap();
        assert!(unfiltered.output.contains_text("customer: shop.Customer"));
    }

    #[test]
    fn test_descriptor_set_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.pb");
        fs::write(&path, fixtures::shop_set().encode_to_vec()).unwrap();

        let mut explorer = Explorer::default();
        let first = explorer.load_descriptor_set(&path).unwrap();
        let second = explorer.load_descriptor_set(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(explorer.cache().len(), 1);
    }

    #[test]
    fn test_format_text_uses_config_indent() {
        let mut config = ExplorerConfig::default();
        config.render.indent_width = 4;
        let explorer = Explorer::new(config);
        let pool = fixtures::shop_pool();

        let report = explorer.render(&pool, "shop.RingA", "", None).unwrap();
        let text = explorer.format_text(&report);
        assert!(text.starts_with("▾ shop.RingA\n- next: shop.RingB\n    ▸ shop.RingB\n"));
    }
}
