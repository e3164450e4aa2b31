//! Command-line and environment configuration.
//!
//! Flags take precedence over the environment. The API key is the only
//! required setting; it is read from `--api-key`, then `GEMINI_API_KEY`, then
//! `GOOGLE_API_KEY`. A `.env` file in the working directory is honoured.

use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::{env, ffi::OsString, path::PathBuf, time::Duration};

use crate::{
    agent::AgentConfig,
    client::{DEFAULT_BASE_URL, DEFAULT_MODEL},
    orchestrator::PollPolicy,
};

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

pub const USAGE: &str = "\
Ask a question about a video; the answer may draw on web search.

USAGE:
    video-analyst [OPTIONS] <VIDEO> <QUESTION>...

ARGS:
    <VIDEO>          Video file to analyze (mp4, mov or avi)
    <QUESTION>...    Question about the video

OPTIONS:
    --api-key <KEY>          Gemini API key [env: GEMINI_API_KEY, GOOGLE_API_KEY]
    --model <MODEL>          Model to use [default: models/gemini-2.0-flash]
    --base-url <URL>         Gemini API base URL
    --poll-interval <SECS>   Seconds between processing checks [default: 2]
    --timeout <SECS>         Maximum seconds to wait for processing [default: 600]
    --temperature <T>        Sampling temperature between 0 and 2 [default: model's own]
    -h, --help               Print help
";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid arguments"))]
    Args { source: pico_args::Error },

    #[snafu(display("unknown option '{flag}'"))]
    UnknownFlag { flag: String },

    #[snafu(display(
        "no API key given; pass --api-key or set {}",
        API_KEY_VARS.join(" or ")
    ))]
    MissingApiKey,

    #[snafu(display("no video file given"))]
    MissingVideo,

    #[snafu(display("no question given"))]
    MissingQuestion,

    #[snafu(display("argument '{}' is not valid UTF-8", value.to_string_lossy()))]
    NonUtf8Argument { value: OsString },
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Analyze(Config),
}

/// Settings for one run of the analyzer.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub poll: PollPolicy,
    pub temperature: Option<f32>,
    pub video: PathBuf,
    pub question: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("poll", &self.poll)
            .field("temperature", &self.temperature)
            .field("video", &self.video)
            .field("question", &self.question)
            .finish()
    }
}

impl Config {
    /// Agent settings derived from this configuration.
    pub fn agent(&self) -> AgentConfig {
        AgentConfig {
            temperature: self.temperature,
            ..AgentConfig::default().with_model(self.model.as_str())
        }
    }
}

impl Command {
    /// Parses the process arguments, falling back to the process environment
    /// (after loading `.env`) for the API key.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        Self::parse(env::args_os().skip(1).collect(), |name| env::var(name).ok())
    }

    /// Parses `args` (without the program name), looking up unset values
    /// through `lookup_env`.
    pub fn parse(
        args: Vec<OsString>,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let mut args = pico_args::Arguments::from_vec(args);

        if args.contains(["-h", "--help"]) {
            return Ok(Command::Help);
        }

        let api_key: Option<String> = args.opt_value_from_str("--api-key").context(ArgsSnafu)?;
        let model: Option<String> = args.opt_value_from_str("--model").context(ArgsSnafu)?;
        let base_url: Option<String> = args.opt_value_from_str("--base-url").context(ArgsSnafu)?;
        let interval = args
            .opt_value_from_fn("--poll-interval", parse_seconds)
            .context(ArgsSnafu)?;
        let timeout = args
            .opt_value_from_fn("--timeout", parse_seconds)
            .context(ArgsSnafu)?;
        let temperature = args
            .opt_value_from_fn("--temperature", parse_temperature)
            .context(ArgsSnafu)?;

        let free = args
            .finish()
            .into_iter()
            .map(|value| value.into_string().map_err(|value| Error::NonUtf8Argument { value }))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(flag) = free.iter().find(|value| value.starts_with("--")) {
            return UnknownFlagSnafu { flag: flag.as_str() }.fail();
        }

        let mut free = free.into_iter();
        let video = free.next().map(PathBuf::from).context(MissingVideoSnafu)?;
        let question = free.collect::<Vec<_>>().join(" ");
        ensure!(!question.trim().is_empty(), MissingQuestionSnafu);

        let api_key = api_key
            .or_else(|| API_KEY_VARS.iter().find_map(|name| lookup_env(*name)))
            .filter(|key| !key.trim().is_empty())
            .context(MissingApiKeySnafu)?;

        Ok(Command::Analyze(Config {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            poll: PollPolicy::new(
                interval.unwrap_or(PollPolicy::DEFAULT_INTERVAL),
                timeout.unwrap_or(PollPolicy::DEFAULT_TIMEOUT),
            ),
            temperature,
            video,
            question,
        }))
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(Duration::from_secs_f64(secs))
    } else {
        Err(format!("'{value}' must be a positive number of seconds"))
    }
}

fn parse_temperature(value: &str) -> Result<f32, String> {
    let temperature: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=2.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(format!("temperature '{value}' must be between 0 and 2"))
    }
}
