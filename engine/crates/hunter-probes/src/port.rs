//! Port scanning - TCP connect scan
//!
//! Completes a full handshake against each port; a successful connect means
//! the port is open. Closed and filtered ports produce no finding.

use async_trait::async_trait;
use hunter_core::{
    Error, Finding, Result, ScanContext, ScanOptions, ScanResult, Scanner, Severity, Target,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Extra argument holding a port specification
pub const PORTS_ARG: &str = "ports";

/// Connect timeout used when the options carry none
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(3);

/// Common port lists
pub mod ports {
    /// Ports scanned when neither the options nor the target name any
    pub const COMMON: &[u16] = &[
        21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389,
        5432, 5900, 6379, 8080, 8443, 8888, 27017,
    ];

    /// Parse a port specification string.
    ///
    /// Supports: "80", "80,443", "1-1024", "80,443,8000-9000", and "common"
    /// (or an empty string) for [`COMMON`]. Order is preserved and duplicates
    /// are removed.
    pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>, String> {
        let spec = spec.trim();
        if spec.is_empty() || spec.eq_ignore_ascii_case("common") {
            return Ok(COMMON.to_vec());
        }

        let mut ports = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_port(start)?;
                    let end = parse_port(end)?;
                    if start > end {
                        return Err(format!("Invalid range: {} > {}", start, end));
                    }
                    ports.extend(start..=end);
                }
                None => ports.push(parse_port(part)?),
            }
        }

        let mut seen = std::collections::HashSet::new();
        ports.retain(|p| seen.insert(*p));
        Ok(ports)
    }

    fn parse_port(s: &str) -> Result<u16, String> {
        let s = s.trim();
        let port: u32 = s.parse().map_err(|_| format!("Invalid port: {:?}", s))?;
        match u16::try_from(port) {
            Ok(port) if port >= 1 => Ok(port),
            _ => Err(format!("Port {} out of range (1-65535)", port)),
        }
    }
}

/// Typical service name for a well-known port
pub fn identify_service(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        111 => "RPC",
        135 => "MSRPC",
        139 => "NetBIOS",
        143 => "IMAP",
        443 => "HTTPS",
        445 => "SMB",
        993 => "IMAPS",
        995 => "POP3S",
        1723 => "PPTP",
        3306 => "MySQL",
        3389 => "RDP",
        5432 => "PostgreSQL",
        5900 => "VNC",
        6379 => "Redis",
        8080 | 8888 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        27017 => "MongoDB",
        _ => "unknown",
    }
}

/// Ports to probe: the `ports` extra argument, else the target's own ports,
/// else the common list
pub fn resolve_ports(target: &Target, opts: &ScanOptions) -> Result<Vec<u16>> {
    if let Some(spec) = opts.extra_args.get_str(PORTS_ARG)? {
        if !spec.trim().is_empty() {
            return ports::parse_port_spec(spec).map_err(|message| Error::InvalidOption {
                key: PORTS_ARG.to_string(),
                message,
            });
        }
    }
    if !target.ports.is_empty() {
        return Ok(target.ports.clone());
    }
    Ok(ports::COMMON.to_vec())
}

/// TCP connect port scanner, registered as `port`
#[derive(Debug, Clone, Copy, Default)]
pub struct PortScanner;

impl PortScanner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scanner for PortScanner {
    fn name(&self) -> &str {
        "port"
    }

    fn description(&self) -> &str {
        "TCP port scanner"
    }

    async fn run(&self, ctx: &ScanContext, target: &Target, opts: &ScanOptions) -> Result<ScanResult> {
        let ports = resolve_ports(target, opts)?;
        let connect_timeout = if opts.timeout.is_zero() {
            FALLBACK_TIMEOUT
        } else {
            opts.timeout
        };
        let verbose = opts.verbose;
        let mut result = ScanResult::begin(self.name(), target);

        debug!(
            "Scanning {} ports on {} (concurrency {})",
            ports.len(),
            target.host,
            opts.effective_concurrency()
        );

        let semaphore = Arc::new(Semaphore::new(opts.effective_concurrency()));
        let host: Arc<str> = Arc::from(target.host.as_str());
        let mut tasks = JoinSet::new();

        for port in ports {
            let permit = tokio::select! {
                biased;
                _ = ctx.done() => break,
                permit = semaphore.clone().acquire_owned() => permit,
            };
            let Ok(permit) = permit else { break };

            let ctx = ctx.clone();
            let host = host.clone();
            tasks.spawn(async move {
                let open = tcp_connect(&ctx, &host, port, connect_timeout, verbose).await;
                drop(permit);
                open.then_some(port)
            });
        }

        let mut open_ports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(port)) => open_ports.push(port),
                Ok(None) => {}
                Err(err) => warn!("Port probe task failed: {}", err),
            }
        }
        open_ports.sort_unstable();

        for port in open_ports {
            let service = identify_service(port);
            result.findings.push(
                Finding::builder(format!("Open port: {}/{}", port, service))
                    .description(format!("TCP port {} is open ({})", port, service))
                    .severity(Severity::Info)
                    .metadata("port", port.to_string())
                    .metadata("protocol", "tcp")
                    .metadata("service", service)
                    .build(),
            );
        }

        Ok(match ctx.err() {
            Some(err) => result.finish_with_error(err),
            None => result.finish(),
        })
    }
}

/// Whether a TCP handshake with `host:port` completes in time.
/// With `verbose`, closed and filtered ports are logged at debug level.
async fn tcp_connect(
    ctx: &ScanContext,
    host: &str,
    port: u16,
    connect_timeout: Duration,
    verbose: bool,
) -> bool {
    tokio::select! {
        _ = ctx.done() => false,
        attempt = timeout(connect_timeout, TcpStream::connect((host, port))) => match attempt {
            Ok(Ok(_stream)) => {
                debug!("Port {}:{} is open", host, port);
                true
            }
            Ok(Err(e)) => {
                if verbose {
                    debug!("Port {}:{} closed: {}", host, port, e);
                } else {
                    trace!("Port {}:{} error: {}", host, port, e);
                }
                false
            }
            Err(_) => {
                if verbose {
                    debug!("Port {}:{} timeout (filtered)", host, port);
                } else {
                    trace!("Port {}:{} timeout (filtered)", host, port);
                }
                false
            }
        },
    }
}
