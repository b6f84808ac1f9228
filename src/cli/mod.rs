//! CLI argument parsing module
//!
//! Runs one or more URLs through a single client so cookies set by earlier
//! responses are sent with later requests.

use crate::config::{HttpMethod, OutputConfig, RequestFields};
use crate::error::{Error, Result};
use crate::exit_code::{exit_code_for_error, exit_code_for_results};
use crate::http::response::RunResult;
use crate::http::RequestClient;
use crate::logging;
use crate::output::OutputWriter;
use crate::user_agent::BrowserAgent;
use crate::utils::{FileUtils, StringUtils, UrlUtils};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::{BTreeMap, HashMap};

/// Everything one invocation asks for
#[derive(Debug, Clone)]
pub struct Invocation {
    pub urls: Vec<String>,
    /// Sent with every URL
    pub headers: HashMap<String, String>,
    pub user_agent: Option<String>,
    pub method: HttpMethod,
    pub data: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Apply method, data and body to every URL, not only the last
    pub same: bool,
    pub reset_between: bool,
    pub output: OutputConfig,
}

impl Invocation {
    /// Fields for the `index`-th URL of the chain; `index` must be below `urls.len()`.
    pub(crate) fn fields_for(&self, index: usize) -> RequestFields {
        let fields = RequestFields::new().url(self.urls[index].clone());
        if self.same || index + 1 == self.urls.len() {
            let fields = fields.method(self.method.clone()).data(self.data.clone());
            match &self.body {
                Some(body) => fields.body(body.clone()),
                None => fields,
            }
        } else {
            fields
                .method(HttpMethod::Get)
                .data(BTreeMap::<String, String>::new())
                .clear_body()
        }
    }
}

/// Main entry point for the CLI application
pub fn run() {
    let matches = create_app().get_matches();
    logging::init(matches.get_flag("verbose"));

    let code = match build_invocation_from_args(&matches) {
        Ok(invocation) => {
            let writer = OutputWriter::new(invocation.output.clone());
            match run_invocation(&invocation) {
                Ok(results) => match writer.write_results(&results) {
                    Ok(()) => exit_code_for_results(&results),
                    Err(e) => {
                        writer.write_error(&e.to_string());
                        exit_code_for_error(&e)
                    }
                },
                Err(e) => {
                    writer.write_error(&e.to_string());
                    exit_code_for_error(&e)
                }
            }
        }
        Err(e) => {
            eprintln!("jarhttp: error: {}", e);
            exit_code_for_error(&e)
        }
    };

    std::process::exit(code);
}

/// Run every URL of the invocation through one client
pub fn run_invocation(invocation: &Invocation) -> Result<Vec<RunResult>> {
    let mut client =
        RequestClient::new(RequestFields::new().headers(invocation.headers.clone()))?;
    if let Some(user_agent) = &invocation.user_agent {
        client.set_user_agent(user_agent.clone());
    }

    let mut results = Vec::with_capacity(invocation.urls.len());
    for index in 0..invocation.urls.len() {
        if index > 0 && invocation.reset_between {
            client.reset()?;
        }
        let result = client.run(invocation.fields_for(index));
        match &result {
            RunResult::Response(response) => log::info!(
                "{} -> {} in {:.3}s",
                response.url,
                response.code,
                response.duration
            ),
            RunResult::Error(error) => log::info!(
                "{} failed ({}): {}",
                invocation.urls[index],
                error.code_label(),
                error.exception
            ),
        }
        results.push(result);
    }

    Ok(results)
}

/// Create the CLI application structure
pub fn create_app() -> Command {
    Command::new("jarhttp")
        .version(crate::VERSION)
        .about("Chain HTTP requests through one client that keeps cookies")
        .arg(Arg::new("url")
            .help("URLs to request, in order")
            .required(true)
            .num_args(1..)
            .index(1))
        .arg(Arg::new("request")
            .short('X')
            .long("request")
            .value_name("METHOD")
            .help("HTTP method for the last URL")
            .default_value("GET"))
        .arg(Arg::new("header")
            .short('H')
            .long("header")
            .value_name("HEADER")
            .help("Add a 'Name: value' header to every request")
            .action(ArgAction::Append))
        .arg(Arg::new("data")
            .short('d')
            .long("data")
            .value_name("KEY=VALUE")
            .help("Form field sent with the last URL")
            .action(ArgAction::Append))
        .arg(Arg::new("body")
            .long("body")
            .value_name("STRING")
            .help("Raw request body for the last URL; overrides --data"))
        .arg(Arg::new("user-agent")
            .short('A')
            .long("user-agent")
            .value_name("STRING")
            .help("User-Agent header")
            .conflicts_with("browser"))
        .arg(Arg::new("browser")
            .long("browser")
            .value_name("NAME")
            .help("Use a bundled browser User-Agent (firefox, chrome, safari, ie, ...)"))
        .arg(Arg::new("same")
            .long("same")
            .help("Send method, data and body with every URL")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("reset-between")
            .long("reset-between")
            .help("Clear cookies between URLs")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .help("Write results to file"))
        .arg(Arg::new("pretty")
            .long("pretty")
            .help("Pretty-print JSON results")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("silent")
            .short('s')
            .long("silent")
            .help("Silent mode")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Verbose logging")
            .action(ArgAction::SetTrue))
}

/// Build the invocation from command line arguments
pub fn build_invocation_from_args(matches: &ArgMatches) -> Result<Invocation> {
    let urls = matches
        .get_many::<String>("url")
        .map(|values| {
            values
                .map(|value| UrlUtils::validate_url(value).map(|url| url.to_string()))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    if urls.is_empty() {
        return Err(Error::Config("At least one URL is required".to_string()));
    }

    let method = match matches.get_one::<String>("request") {
        Some(method_str) => method_str.parse::<HttpMethod>().map_err(Error::Config)?,
        None => HttpMethod::Get,
    };

    let mut headers = HashMap::new();
    if let Some(values) = matches.get_many::<String>("header") {
        for header_str in values {
            let (key, value) = StringUtils::parse_header(header_str)?;
            headers.insert(key, value);
        }
    }

    let mut data = BTreeMap::new();
    if let Some(values) = matches.get_many::<String>("data") {
        for pair in values {
            let (key, value) = StringUtils::parse_pair(pair)?;
            data.insert(key, value);
        }
    }

    let user_agent = match (
        matches.get_one::<String>("user-agent"),
        matches.get_one::<String>("browser"),
    ) {
        (Some(user_agent), _) => Some(user_agent.clone()),
        (None, Some(name)) => {
            let agent = name
                .parse::<BrowserAgent>()
                .map_err(|_| Error::Config(format!("Unknown browser: {}", name)))?;
            Some(agent.user_agent().to_string())
        }
        (None, None) => None,
    };

    let file = matches
        .get_one::<String>("output")
        .map(|path| FileUtils::expand_path(path))
        .transpose()?;

    Ok(Invocation {
        urls,
        headers,
        user_agent,
        method,
        data,
        body: matches.get_one::<String>("body").cloned(),
        same: matches.get_flag("same"),
        reset_between: matches.get_flag("reset-between"),
        output: OutputConfig {
            file,
            pretty: matches.get_flag("pretty"),
            silent: matches.get_flag("silent"),
        },
    })
}
