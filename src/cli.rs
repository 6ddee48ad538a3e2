//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;
use imagen_playground::forms::FormConfig;
use imagen_playground::model::ModelKey;
use imagen_playground::params::{
    validate_aspect_ratio, validate_output_format, validate_resolution, validate_safety_filter_level,
};

/// Run one prediction against the image playground proxy.
#[derive(Parser, Debug)]
#[command(name = "playground", version, about)]
pub struct Cli {
    /// Text prompt, or edit instruction for revise.
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Model key or alias: nano-banana, remove-bg, seedream, revise.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Aspect ratio (e.g., 1:1, 16:9, `match_input_image`).
    #[arg(short, long)]
    pub aspect_ratio: Option<String>,

    /// Resolution (nano-banana): 1K, 2K, 4K.
    #[arg(short, long)]
    pub resolution: Option<String>,

    /// Output format (nano-banana, revise): png, jpg, webp.
    #[arg(short = 'f', long)]
    pub output_format: Option<String>,

    /// Safety filter level (nano-banana).
    #[arg(long)]
    pub safety_filter_level: Option<String>,

    /// Input image file. Repeat for several reference images.
    #[arg(short, long = "image")]
    pub images: Vec<PathBuf>,

    /// Input image URL (remove-bg, revise).
    #[arg(short = 'u', long)]
    pub image_url: Option<String>,

    /// Size preset (seedream): 1K, 2K, 4K, custom.
    #[arg(short, long)]
    pub size: Option<String>,

    /// Custom width in pixels (seedream, size=custom).
    #[arg(long)]
    pub width: Option<u32>,

    /// Custom height in pixels (seedream, size=custom).
    #[arg(long)]
    pub height: Option<u32>,

    /// Maximum images to generate (seedream).
    #[arg(long)]
    pub max_images: Option<u32>,

    /// Sequential image generation (seedream): disabled, auto.
    #[arg(long)]
    pub sequential: Option<String>,

    /// Enable content moderation (remove-bg).
    #[arg(long)]
    pub content_moderation: bool,

    /// Drop semi-transparent edge pixels (remove-bg).
    #[arg(long)]
    pub no_preserve_partial_alpha: bool,

    /// Refine the prompt before submitting.
    #[arg(long)]
    pub refine: bool,

    /// Output file path (defaults to generated-image.<ext>).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not download the resulting image.
    #[arg(long)]
    pub no_download: bool,

    /// Print the raw job JSON to stdout.
    #[arg(long)]
    pub json: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn resolve_prompt(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(ref text) = self.prompt {
            Ok(Some(text.clone()))
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Check option values against what `model` offers.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first unsupported value.
    pub fn validate(&self, model: ModelKey) -> Result<(), String> {
        if let Some(ratio) = &self.aspect_ratio {
            validate_aspect_ratio(ratio, model)?;
        }
        if let Some(resolution) = &self.resolution {
            validate_resolution(resolution)?;
        }
        if let Some(format) = &self.output_format {
            validate_output_format(format)?;
        }
        if let Some(level) = &self.safety_filter_level {
            validate_safety_filter_level(level)?;
        }
        Ok(())
    }

    /// Copy the given options into `form`. Options the form has no field for
    /// are ignored.
    pub async fn configure(&self, form: &mut FormConfig, prompt: Option<String>) {
        match form {
            FormConfig::NanoBanana(form) => {
                if let Some(prompt) = prompt {
                    form.prompt = prompt;
                }
                set(&mut form.resolution, self.resolution.as_ref());
                set(&mut form.output_format, self.output_format.as_ref());
                set(&mut form.safety_filter_level, self.safety_filter_level.as_ref());
                form.add_files(self.images.iter().cloned()).await;
                if let Some(ratio) = &self.aspect_ratio {
                    form.set_aspect_ratio(ratio.clone()).await;
                }
            }
            FormConfig::RemoveBackground(form) => {
                set(&mut form.image_url, self.image_url.as_ref());
                form.content_moderation = self.content_moderation;
                form.preserve_partial_alpha = !self.no_preserve_partial_alpha;
                form.select_files(self.images.iter().cloned());
            }
            FormConfig::Seedream(form) => {
                if let Some(prompt) = prompt {
                    form.prompt = prompt;
                }
                set(&mut form.size, self.size.as_ref());
                set(&mut form.sequential_image_generation, self.sequential.as_ref());
                form.width = self.width.or(form.width);
                form.height = self.height.or(form.height);
                form.max_images = self.max_images.unwrap_or(form.max_images);
                form.add_files(self.images.iter().cloned()).await;
                if let Some(ratio) = &self.aspect_ratio {
                    form.set_aspect_ratio(ratio.clone()).await;
                }
            }
            FormConfig::Revise(form) => {
                if let Some(prompt) = prompt {
                    form.prompt = prompt;
                }
                set(&mut form.image_url, self.image_url.as_ref());
                set(&mut form.output_format, self.output_format.as_ref());
                if let Some(first) = self.images.first() {
                    form.select_file(first.clone()).await;
                }
                if let Some(ratio) = &self.aspect_ratio {
                    form.set_aspect_ratio(ratio.clone()).await;
                }
            }
        }
    }
}

fn set(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}
