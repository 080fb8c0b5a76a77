//! memdocdb CLI Client
//!
//! Command-line interface for interacting with a memdocdb server, including
//! an end-to-end protocol check.

use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use memdocdb::network::Client;
use memdocdb::protocol::{Action, Request, Response};
use memdocdb::Config;
use serde_json::{json, Value};

/// memdocdb CLI
#[derive(Parser, Debug)]
#[command(name = "memdocdb-cli")]
#[command(about = "CLI for the memdocdb document database")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    /// Connect/read timeout in seconds
    #[arg(short, long, default_value = "2")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a raw JSON request
    Send {
        /// The request, e.g. '{"action":"list"}'
        json: String,
    },

    /// List document names
    List,

    /// Count the records of a document
    Count {
        /// The document name
        document: String,
    },

    /// Run the end-to-end protocol check and print a report
    Check {
        /// Scratch document (dropped before and after)
        #[arg(short, long, default_value = "users_test")]
        document: String,

        /// Node config whose replicas get a connectivity check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extra latency samples per action
        #[arg(long, default_value = "3")]
        iterations: usize,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout);

    let mut client = match Client::connect_timeout(&args.server, Some(timeout)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Connect error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Send { json } => client.send_raw(&json).map(print_response),
        Commands::List => client.send(&Request::new(Action::List)).map(print_response),
        Commands::Count { document } => client
            .send(&Request::new(Action::Count).with_document(document))
            .map(print_response),
        Commands::Check {
            document,
            config,
            iterations,
        } => {
            let report = run_check(&mut client, &document, config, iterations, timeout);
            let ok = report.print();
            let _ = client.quit();
            return if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
        }
    };

    match result {
        Ok(()) => {
            let _ = client.quit();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_response(response: Response) {
    let text = serde_json::to_string_pretty(&response.to_value()).unwrap_or_default();
    println!("{}", text);
}

// =============================================================================
// End-to-end check
// =============================================================================

#[derive(Default)]
struct Report {
    results: Vec<(bool, &'static str)>,
    latencies: Vec<(String, Vec<f64>)>,
    replicas: Vec<(String, Result<(), String>)>,
}

impl Report {
    fn check(&mut self, pass: bool, message: &'static str) {
        self.results.push((pass, message));
    }

    fn sample(&mut self, action: &str, ms: f64) {
        match self.latencies.iter_mut().find(|(name, _)| name == action) {
            Some((_, samples)) => samples.push(ms),
            None => self.latencies.push((action.to_string(), vec![ms])),
        }
    }

    /// Print the report; true when every check passed
    fn print(&self) -> bool {
        println!("Test Report");
        println!("===========");
        println!("Latency by action (ms):");
        for (action, samples) in &self.latencies {
            let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = samples.iter().cloned().fold(0.0, f64::max);
            let avg = samples.iter().sum::<f64>() / samples.len() as f64;
            println!("- {}: avg {:.2}, min {:.2}, max {:.2}", action, avg, min, max);
        }

        let reachable = self.replicas.iter().filter(|(_, r)| r.is_ok()).count();
        println!("Replicas configured: {}", self.replicas.len());
        println!("Replicas reachable: {}", reachable);
        for (target, outcome) in &self.replicas {
            match outcome {
                Ok(()) => println!("Replica {}: OK", target),
                Err(e) => println!("Replica {}: FAIL - {}", target, e),
            }
        }

        let mut passed = 0;
        for (index, (pass, message)) in self.results.iter().enumerate() {
            let label = if *pass { "PASS" } else { "FAIL" };
            if *pass {
                passed += 1;
            }
            println!("{:02}) {} - {}", index + 1, label, message);
        }
        println!("-----------");
        println!("Passed: {}", passed);
        println!("Failed: {}", self.results.len() - passed);

        passed == self.results.len()
    }
}

/// Send one request, recording latency; `None` when no response came back
fn timed(client: &mut Client, report: &mut Report, label: &str, request: Request) -> Option<Response> {
    let start = Instant::now();
    let response = client.send(&request).ok();
    report.sample(label, start.elapsed().as_secs_f64() * 1000.0);
    response
}

fn succeeded(response: &Option<Response>) -> bool {
    response.as_ref().is_some_and(Response::is_success)
}

fn entries(response: &Option<Response>) -> usize {
    match response.as_ref().and_then(|r| r.get("data")) {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        _ => 0,
    }
}

fn count_of(response: &Option<Response>) -> Option<u64> {
    response.as_ref()?.get("count")?.as_u64()
}

fn run_check(
    client: &mut Client,
    document: &str,
    config: Option<PathBuf>,
    iterations: usize,
    timeout: Duration,
) -> Report {
    let mut report = Report::default();
    let doc = || document.to_string();

    let latency = timed(client, &mut report, "latency_check", Request::new(Action::List));
    report.check(latency.is_some(), "latency check (list) returns response");

    if let Some(path) = config {
        match Config::from_file(&path) {
            Ok(config) => {
                for replica in &config.replicas {
                    let outcome = check_replica(&replica.addr(), timeout);
                    report.replicas.push((replica.addr(), outcome));
                }
            }
            Err(e) => eprintln!("Skipping replica check: {}", e),
        }
    }

    let resp = timed(client, &mut report, "list", Request::new(Action::List));
    report.check(resp.is_some(), "list returns response");

    // Leftovers from an earlier run; an error here is expected
    timed(client, &mut report, "drop", Request::new(Action::Drop).with_document(doc()));

    let resp = timed(client, &mut report, "create", Request::new(Action::Create).with_document(doc()));
    report.check(succeeded(&resp), "create document");

    let people = json!([
        {"name": "John", "role": "Dev", "gender": "Male"},
        {"name": "Anna", "role": "QA", "gender": "Female"}
    ]);
    let resp = timed(
        client,
        &mut report,
        "insert",
        Request::new(Action::Insert).with_document(doc()).with_data(people),
    );
    report.check(succeeded(&resp), "insert entries");

    let resp = timed(client, &mut report, "get", Request::new(Action::Get).with_document(doc()));
    report.check(entries(&resp) == 2, "get document returns 2 entries");

    let resp = timed(
        client,
        &mut report,
        "get_by_id",
        Request::new(Action::Get).with_document(doc()).with_id(0),
    );
    let name = resp
        .as_ref()
        .and_then(|r| r.get("data"))
        .and_then(|d| d.get(0).or_else(|| d.get("0")))
        .and_then(|r| r.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    report.check(name.as_deref() == Some("John"), "get by id returns John");

    let resp = timed(client, &mut report, "getkeys", Request::new(Action::GetKeys).with_document(doc()));
    let keys_ok = resp
        .as_ref()
        .and_then(|r| r.get("document_keys"))
        .and_then(Value::as_array)
        .is_some_and(|keys| {
            ["name", "role", "gender"]
                .iter()
                .all(|k| keys.iter().any(|v| v.as_str() == Some(*k)))
        });
    report.check(keys_ok, "getkeys includes name/role/gender");

    let resp = timed(
        client,
        &mut report,
        "query",
        Request::new(Action::Get)
            .with_document(doc())
            .with_query(json!({"gender": "Male"})),
    );
    report.check(entries(&resp) == 1, "query returns 1 entry");

    let resp = timed(client, &mut report, "count", Request::new(Action::Count).with_document(doc()));
    report.check(count_of(&resp) == Some(2), "count returns 2");

    let replacement = json!([
        {"name": "John", "role": "Lead", "gender": "Male"},
        {"name": "Andrew", "role": "Dev", "gender": "Male"}
    ]);
    let resp = timed(
        client,
        &mut report,
        "update",
        Request::new(Action::Update)
            .with_document(doc())
            .with_id(0)
            .with_data(replacement),
    );
    report.check(succeeded(&resp), "update whole document");

    let resp = timed(
        client,
        &mut report,
        "delete",
        Request::new(Action::Delete).with_document(doc()).with_id(0),
    );
    report.check(succeeded(&resp), "delete entry");

    let resp = timed(
        client,
        &mut report,
        "count_after_delete",
        Request::new(Action::Count).with_document(doc()),
    );
    report.check(count_of(&resp) == Some(1), "count after delete returns 1");

    let resp = timed(client, &mut report, "empty", Request::new(Action::Empty).with_document(doc()));
    report.check(succeeded(&resp), "empty document");

    let resp = timed(client, &mut report, "drop_final", Request::new(Action::Drop).with_document(doc()));
    report.check(succeeded(&resp), "drop document");

    let resp = timed(client, &mut report, "getall", Request::new(Action::GetAll));
    report.check(resp.is_some(), "getall returns response");

    let samples = [
        ("list_sample", Request::new(Action::List)),
        ("getall_sample", Request::new(Action::GetAll)),
        ("count_sample", Request::new(Action::Count).with_document(doc())),
    ];
    for (label, request) in samples {
        for _ in 0..iterations {
            timed(client, &mut report, label, request.clone());
        }
    }

    report
}

fn check_replica(addr: &str, timeout: Duration) -> Result<(), String> {
    use std::net::ToSocketAddrs;

    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|e| e.to_string())?
        .next()
        .ok_or_else(|| "address resolves to nothing".to_string())?;
    TcpStream::connect_timeout(&socket_addr, timeout)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
