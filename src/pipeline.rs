use image::DynamicImage;
use std::sync::Arc;
use std::collections::HashMap;
use std::sync::mpsc::{self, Sender, Receiver};
use anyhow::Result;
use tracing::{debug, info};

use crate::models::WordCandidate;

/// Bounding box in the original image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Data that flows through the pipeline
/// Each PipelineData is either the whole page or a single word region
#[derive(Clone)]
pub struct PipelineData {
    /// The image data (color page, chroma map, mask or mask crop)
    pub image: DynamicImage,

    /// Reference to the original page (shared via Arc)
    pub original: Arc<DynamicImage>,

    /// Bounding box in the original image (None means full image)
    pub bbox: Option<BoundingBox>,

    /// The word this item stands for, once the page has been split into words
    pub word: Option<WordCandidate>,

    /// Metadata for tracking properties (e.g., "otsu_level", "coverage_ratio")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Float(f64),
    String(String),
    Int(i64),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            bbox: None,
            word: None,
            metadata: HashMap::new(),
        }
    }

    /// Create PipelineData for one word's region of an image
    pub fn from_word(
        image: DynamicImage,
        original: Arc<DynamicImage>,
        bbox: BoundingBox,
        word: WordCandidate,
    ) -> Self {
        Self {
            image,
            original,
            bbox: Some(bbox),
            word: Some(word),
            metadata: HashMap::new(),
        }
    }

    /// Same item with a replaced image, everything else carried over
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image,
            original: self.original.clone(),
            bbox: self.bbox.clone(),
            word: self.word.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: std::path::PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn debug_dir(&self) -> Option<&std::path::Path> {
        self.debug
            .as_ref()
            .filter(|d| d.enabled)
            .map(|d| d.output_dir.as_path())
    }
}

/// Directory name for a step's debug output, e.g. "03_otsu_threshold"
fn step_dir_name(step_number: usize, step_name: &str) -> String {
    format!("{:02}_{}", step_number, step_name.to_lowercase().replace(' ', "_"))
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directories)
    fn name(&self) -> &str;
}

/// Work item for pipeline execution
/// Contains data and the remaining steps to execute
#[derive(Clone)]
pub struct WorkItem {
    pub data: PipelineData,

    /// Steps not yet executed
    pub remaining_steps: Vec<Arc<dyn PipelineStep>>,

    /// Number of steps already applied
    pub current_step_index: usize,

    /// Lineage: IDs from previous steps that led to this item
    /// E.g., [1, 1, 1, 4] means: the 4th word split off the single mask
    pub lineage: Vec<usize>,
}

impl WorkItem {
    pub fn new(data: PipelineData, steps: Vec<Arc<dyn PipelineStep>>) -> Self {
        Self {
            data,
            remaining_steps: steps,
            current_step_index: 0,
            lineage: vec![],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_steps.is_empty()
    }

    /// Generate filename from lineage (e.g., "01-01-01-04.png")
    pub fn lineage_filename(&self, extension: &str) -> String {
        if self.lineage.is_empty() {
            format!("01.{}", extension)
        } else {
            let ids: Vec<String> = self.lineage.iter().map(|id| format!("{:02}", id)).collect();
            format!("{}.{}", ids.join("-"), extension)
        }
    }

    /// Save this item's image under the directory of the step that produced it
    fn save_debug_output(&self, context: &PipelineContext, step_name: &str) -> Result<()> {
        let Some(output_dir) = context.debug_dir() else {
            return Ok(());
        };

        let dir_name = step_dir_name(self.current_step_index, step_name);
        let step_dir = output_dir.join(&dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let filename = self.lineage_filename("png");
        self.data.image.save(step_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;

        debug!("Debug: saved {}/{}", dir_name, filename);
        Ok(())
    }

    /// Run the next step and create new work items for the remaining steps
    pub fn process_next_step(&self, context: &PipelineContext) -> Result<Vec<WorkItem>> {
        let Some((step, remaining_after)) = self.remaining_steps.split_first() else {
            return Ok(vec![]);
        };
        let step_name = step.name();

        // The step may split 1 item into many
        let results = step.process(vec![self.data.clone()], context)?;

        let mut new_items = Vec::with_capacity(results.len());
        for (idx, result_data) in results.into_iter().enumerate() {
            let mut lineage = self.lineage.clone();
            lineage.push(idx + 1); // 1-indexed for readability

            let new_item = WorkItem {
                data: result_data,
                remaining_steps: remaining_after.to_vec(),
                current_step_index: self.current_step_index + 1,
                lineage,
            };
            new_item.save_debug_output(context, step_name)?;
            new_items.push(new_item);
        }

        Ok(new_items)
    }
}

/// Pipeline executor using MPSC channel for work distribution
pub struct PipelineExecutor {
    sender: Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    context: PipelineContext,
}

impl PipelineExecutor {
    pub fn new(context: PipelineContext) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            context,
        }
    }

    /// Execute the pipeline by processing work items from the channel
    pub fn execute(&self, initial_items: Vec<WorkItem>) -> Result<Vec<PipelineData>> {
        let mut pending_count = initial_items.len();
        for item in initial_items {
            self.sender.send(item)
                .map_err(|e| anyhow::anyhow!("Failed to send work item: {}", e))?;
        }

        let mut completed_results = Vec::new();

        while pending_count > 0 {
            match self.receiver.try_recv() {
                Ok(item) => {
                    pending_count -= 1;

                    if item.is_complete() {
                        completed_results.push(item.data);
                        continue;
                    }

                    for new_item in item.process_next_step(&self.context)? {
                        self.sender.send(new_item)
                            .map_err(|e| anyhow::anyhow!("Failed to send work item: {}", e))?;
                        pending_count += 1;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => {
                    std::thread::yield_now();
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }

        Ok(completed_results)
    }
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Log per-step progress at info level instead of debug
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: std::path::PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn save_debug_input(&self, input: &DynamicImage) -> Result<()> {
        if let Some(output_dir) = self.context.debug_dir() {
            let input_dir = output_dir.join("00_input");
            std::fs::create_dir_all(&input_dir)?;
            input.save(input_dir.join("01.png"))
                .map_err(|e| anyhow::anyhow!("Failed to save debug input: {}", e))?;
            debug!("Debug: saved 00_input/01.png");
        }
        Ok(())
    }

    /// Run the pipeline sequentially, one step at a time over all items
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        self.save_debug_input(&input)?;

        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().enumerate() {
            if self.context.verbose {
                info!("Running step: {} (processing {} items)", step.name(), data.len());
            } else {
                debug!("Running step: {} (processing {} items)", step.name(), data.len());
            }

            data = step.process(data, &self.context)?;

            if let Some(output_dir) = self.context.debug_dir() {
                let dir_name = step_dir_name(step_idx + 1, step.name());
                let step_dir = output_dir.join(&dir_name);
                std::fs::create_dir_all(&step_dir)?;

                for (idx, item) in data.iter().enumerate() {
                    item.image.save(step_dir.join(format!("{:02}.png", idx + 1)))
                        .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
                }
                debug!("Debug: saved {} images to {}/", data.len(), dir_name);
            }

            debug!("  → {} items", data.len());
        }

        Ok(data)
    }

    /// Run the pipeline using the executor with work queue
    pub fn run_with_executor(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        self.save_debug_input(&input)?;

        let initial_item = WorkItem::new(PipelineData::from_image(input), self.steps.clone());

        let executor = PipelineExecutor::new(self.context.clone());
        executor.execute(vec![initial_item])
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
