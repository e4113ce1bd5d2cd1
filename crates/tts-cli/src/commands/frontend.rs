//! Frontend command implementation.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use tracing::debug;

use text_frontend::{Frontend, FrontendFiles};
use tts_core::{FrontendOptions, Lang, TextFrontend};

#[derive(Debug, Args)]
pub struct FrontendArgs {
    /// Text to convert
    pub text: String,

    /// Frontend language (zh or en)
    #[arg(long, default_value = "zh")]
    pub lang: Lang,

    /// Phone vocabulary file
    #[arg(long)]
    pub phones_dict: PathBuf,

    /// Pronunciation lexicon
    #[arg(long)]
    pub lexicon: PathBuf,

    /// Tone vocabulary file
    #[arg(long)]
    pub tones_dict: Option<PathBuf>,

    /// Also produce tone ids
    #[arg(long)]
    pub tones: bool,

    /// Keep sentences as separate entries
    #[arg(long)]
    pub no_merge: bool,
}

/// Run the frontend command.
pub fn run(args: &FrontendArgs) -> Result<()> {
    if args.tones && args.tones_dict.is_none() {
        bail!("--tones needs --tones-dict");
    }

    let mut files = FrontendFiles::new(&args.lexicon, &args.phones_dict);
    if let Some(tones) = &args.tones_dict {
        files = files.with_tones(tones);
    }
    let frontend = Frontend::load(args.lang, &files)?;

    let options = FrontendOptions {
        merge_sentences: !args.no_merge,
        get_tone_ids: args.tones,
    };
    debug!(?options, "Running frontend");
    let features = frontend.get_input_ids(&args.text, options)?;

    println!("Input: \"{}\"", args.text);
    println!("Language: {}", args.lang);
    println!("Entries: {}", features.num_entries());
    println!();

    for (i, phones) in features.phone_ids.iter().enumerate() {
        println!("[{i}] {} phones", phones.len());
        println!("  phone ids: {phones:?}");
        if let Some(tones) = features.tone_ids.as_ref().and_then(|t| t.get(i)) {
            println!("  tone ids:  {tones:?}");
        }
    }

    Ok(())
}
