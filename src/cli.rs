use clap::Parser;

use crate::config::SettingsOverrides;

#[derive(Parser, Debug)]
#[command(name = "vidgrab", version)]
#[command(about = "Download or play videos embedded in web pages", long_about = None)]
pub struct Cli {
    /// Save the download under this name
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Play the video after downloading it
    #[arg(short, long)]
    pub play: bool,

    /// Player command; `{}` or `%s` marks the file
    #[arg(long)]
    pub player: Option<String>,

    /// Proxy URL (http, https, socks5)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Preferred quality: high, medium or low
    #[arg(short = 'r', long)]
    pub quality: Option<String>,

    /// Also fetch subtitles when the site offers them
    #[arg(long)]
    pub subtitles: bool,

    /// Show what would be downloaded, then stop
    #[arg(short, long)]
    pub info: bool,

    #[arg(short, long)]
    pub quiet: bool,

    #[arg(short, long)]
    pub debug: bool,

    /// Answer yes to every question
    #[arg(short, long)]
    pub yes: bool,

    /// Update the program and installed plugins
    #[arg(short, long)]
    pub update: bool,

    /// Install a plugin file from a path or URL
    #[arg(long, value_name = "PATH|URL")]
    pub add_plugin: Option<String>,

    /// Page URLs, or words to search for
    pub inputs: Vec<String>,
}

/// What the positional inputs ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    Urls(Vec<String>),
    Search(String),
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            filename: self.filename.clone(),
            play: self.play,
            player: self.player.clone(),
            proxy: self.proxy.clone(),
            quality: self.quality.clone(),
            subtitles: self.subtitles,
            info: self.info,
            quiet: self.quiet,
            debug: self.debug,
            yes: self.yes,
        }
    }

    /// URLs when any input looks like one, otherwise a search phrase
    pub fn targets(&self) -> Option<Targets> {
        if self.inputs.is_empty() {
            return None;
        }
        if self.inputs.iter().any(|input| looks_like_url(input)) {
            let urls = self
                .inputs
                .iter()
                .filter(|input| looks_like_url(input))
                .cloned()
                .collect();
            Some(Targets::Urls(urls))
        } else {
            Some(Targets::Search(self.inputs.join(" ")))
        }
    }
}

/// `scheme://...`, or a first path component that is a dotted host name
pub fn looks_like_url(input: &str) -> bool {
    let input = input.trim();
    if input.contains("://") {
        return true;
    }

    let host = input.split('/').next().unwrap_or_default();
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        && labels
            .last()
            .is_some_and(|tld| tld.chars().any(|c| c.is_ascii_alphabetic()))
}
