//! Asset pipelines and the task runner that drives them.
//!
//! - [`sprite`]: image glob → sprite sheet PNG + SCSS fragment
//! - [`style`]: SCSS entry → inlined, prefixed, minified CSS + map
//! - [`script`]: script glob → lowered, minified bundle + index map
//! - [`version`]: cache-busting `?v=` markers in templates

pub mod script;
pub mod sprite;
pub mod style;
pub mod version;

mod scan;

use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::debug;
use crate::task::{TaskError, TaskId, TaskReport, TaskRunner};

/// Runs each [`TaskId`] against a shared configuration.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    config: Arc<PipelineConfig>,
}

impl PipelineRunner {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

impl TaskRunner for PipelineRunner {
    fn run(&self, task: TaskId) -> Result<TaskReport, TaskError> {
        let start = Instant::now();
        let config = &self.config;

        let written = match task {
            TaskId::Sprites => sprite::build(&config.sprites)?,
            TaskId::Styles => style::build(config)?,
            TaskId::Scripts => script::build(&config.scripts)?,
            TaskId::CacheBust => version::bust(&config.cachebust.templates)?,
        };

        for path in &written {
            debug!(task.name(); "wrote {}", config.root_relative(path).display());
        }
        debug!(task.name(); "done in {:.0?}", start.elapsed());
        Ok(TaskReport::wrote(written))
    }
}
