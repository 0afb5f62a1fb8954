use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::extract::{FieldExtractor, FixedOffsetExtractor, RegexExtractor};
use crate::Args;

/// How a finished worker hands its aggregate back to the merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    InMemory,
    /// Through a temporary file created in the given directory.
    Spill(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub extractor: Arc<dyn FieldExtractor>,
    pub transfer: Transfer,
}

pub fn default_workers() -> usize {
    std::cmp::min(num_cpus::get(), 8)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            workers: default_workers(),
            extractor: Arc::new(FixedOffsetExtractor::default()),
            transfer: Transfer::InMemory,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_extractor(mut self, extractor: impl FieldExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn with_transfer(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let workers = args.workers.unwrap_or_else(default_workers);

        let extractor: Arc<dyn FieldExtractor> = match &args.pattern {
            Some(pattern) => Arc::new(RegexExtractor::new(pattern).map_err(PipelineError::config)?),
            None => {
                if !args.delimiter.is_ascii() {
                    return Err(PipelineError::config("--delimiter must be an ASCII character"));
                }
                Arc::new(FixedOffsetExtractor {
                    prefix_len: args.prefix_len,
                    delimiter: args.delimiter as u8,
                    date_width: args.date_width,
                })
            }
        };

        let transfer = match &args.spill_dir {
            Some(dir) => Transfer::Spill(dir.clone()),
            None => Transfer::InMemory,
        };

        let config = PipelineConfig {
            workers,
            extractor,
            transfer,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::config("--workers must be greater than 0"));
        }
        self.extractor.validate().map_err(PipelineError::config)?;
        if let Transfer::Spill(dir) = &self.transfer {
            if !dir.is_dir() {
                return Err(PipelineError::config(format!(
                    "Spill directory {:?} does not exist",
                    dir
                )));
            }
        }
        Ok(())
    }
}
