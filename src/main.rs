// src/main.rs

//! `multi-raster`: renders MULTI markup for one sign and prints each page as
//! an ASCII dump, followed by any diagnostics.
//!
//! ```text
//! multi-raster [--config FILE] [--fonts FILE] [--graphics FILE] MARKUP
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use multi_raster::{DeviceConfig, ErrorManager, Message, RenderContext, DEFAULT_CONFIG};

const USAGE: &str = "usage: multi-raster [--config FILE] [--fonts FILE] [--graphics FILE] MARKUP";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    fonts: Option<PathBuf>,
    graphics: Option<PathBuf>,
    markup: String,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut markup: Option<String> = None;
    while let Some(arg) = it.next() {
        let slot = match arg.as_str() {
            "--config" => &mut args.config,
            "--fonts" => &mut args.fonts,
            "--graphics" => &mut args.graphics,
            "-h" | "--help" => bail!(USAGE),
            _ if markup.is_none() => {
                markup = Some(arg);
                continue;
            }
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        };
        let value = it.next().with_context(|| format!("{} needs a file\n{}", arg, USAGE))?;
        *slot = Some(PathBuf::from(value));
    }
    args.markup = markup.with_context(|| USAGE.to_string())?;
    Ok(args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let cfg: Arc<DeviceConfig> = match &args.config {
        Some(path) => Arc::new(DeviceConfig::load(path)?),
        None => {
            info!("No device config given, using the default sign");
            Arc::clone(&DEFAULT_CONFIG)
        }
    };
    let ctx = RenderContext::from_files(args.fonts.as_deref(), args.graphics.as_deref())
        .context("Failed to load fonts or graphics")?;

    let mut msg = Message::parse(&args.markup);
    if args.markup.len() > cfg.max_multi_len {
        warn!(
            "Markup is {} bytes, sign accepts {}",
            args.markup.len(),
            cfg.max_multi_len
        );
    }
    let mut errors = ErrorManager::new();
    msg.render(&cfg, &ctx, Some(&mut errors));

    for (i, page) in msg.pages().iter().enumerate() {
        println!(
            "Page {} (on {}, off {}):",
            i + 1,
            page.page_on(),
            page.page_off()
        );
        if let Some(r) = page.raster() {
            print!("{}", r.dump_bw());
        }
    }
    if errors.is_empty() {
        println!("No errors.");
    } else {
        println!("{} error(s):", errors.len());
        for rec in errors.records() {
            println!("  {}", rec);
        }
    }
    info!("Canonical markup: {}", msg.to_multi());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let a = args(&["--fonts", "f.json", "[jl2]HI"]).expect("args");
        assert_eq!(a.fonts, Some(PathBuf::from("f.json")));
        assert_eq!(a.config, None);
        assert_eq!(a.markup, "[jl2]HI");
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["A", "B"]).is_err());
        assert!(args(&["A", "--config"]).is_err());
    }
}
