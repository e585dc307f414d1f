//! winwifi command line tool
//!
//! Lists interfaces, BSS entries, available networks and stored profiles,
//! and drives connect, disconnect, scan and interface queries. Every native
//! call runs on the blocking pool under the configured timeout.

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::{fmt::Display, path::PathBuf, process, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use winwifi::{
    config::{NetworkPreset, PresetMode},
    wlanapi::WlanApi,
    BssFilter, BssType, ConnectionParameters, MacAddress, Result, Ssid, WifiConfig, WifiError, WlanClient,
};

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let (config, config_path) = match load_configuration(matches.get_one::<String>("config").map(PathBuf::from)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.general.log_level.clone());
    if let Err(e) = init_logging(&log_level) {
        eprintln!("{}", e);
        process::exit(1);
    }

    match &config_path {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No configuration file given, using defaults"),
    }

    if let Err(e) = run(&matches, config).await {
        error!("{}", e);
        process::exit(1);
    }
}

/// Command line definition
fn cli() -> Command {
    let ssid = || {
        Arg::new("ssid")
            .short('s')
            .long("ssid")
            .value_name("SSID")
            .help("Network name")
    };
    let bss_type = || {
        Arg::new("bss-type")
            .long("bss-type")
            .value_name("TYPE")
            .help("BSS type (infrastructure, independent, any)")
    };

    Command::new("winwifi")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Windows Native Wifi client")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("interface")
                .short('i')
                .long("interface")
                .value_name("GUID")
                .help("Wireless interface to use")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Timeout for one native operation")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .subcommand(Command::new("interfaces").about("List wireless interfaces"))
        .subcommand(
            Command::new("bss")
                .about("List BSS entries from the last scan")
                .arg(ssid())
                .arg(bss_type())
                .arg(
                    Arg::new("secure")
                        .long("secure")
                        .help("Only BSS entries with security enabled")
                        .action(ArgAction::SetTrue)
                        .requires("ssid"),
                ),
        )
        .subcommand(Command::new("networks").about("List available networks"))
        .subcommand(Command::new("profiles").about("List stored profiles"))
        .subcommand(
            Command::new("profile")
                .about("Show one stored profile")
                .arg(Arg::new("name").required(true).value_name("NAME")),
        )
        .subcommand(
            Command::new("connect")
                .about("Start a connection attempt")
                .arg(
                    Arg::new("preset")
                        .long("preset")
                        .value_name("NAME")
                        .help("Network preset from the configuration file")
                        .conflicts_with_all(["mode", "profile", "profile-file"]),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_name("MODE")
                        .help("Connection mode")
                        .value_parser([
                            "profile",
                            "temporary_profile",
                            "discovery_secure",
                            "discovery_unsecure",
                            "auto",
                        ]),
                )
                .arg(
                    Arg::new("profile")
                        .short('p')
                        .long("profile")
                        .value_name("NAME")
                        .help("Stored profile name")
                        .conflicts_with("profile-file"),
                )
                .arg(
                    Arg::new("profile-file")
                        .long("profile-file")
                        .value_name("FILE")
                        .help("Profile XML for a temporary profile"),
                )
                .arg(ssid())
                .arg(
                    Arg::new("bssid")
                        .long("bssid")
                        .value_name("MAC")
                        .help("Desired BSSID, may be repeated")
                        .action(ArgAction::Append),
                )
                .arg(bss_type())
                .arg(
                    Arg::new("flags")
                        .long("flags")
                        .value_name("FLAGS")
                        .help("WLAN_CONNECTION_* flags, decimal or 0x hex"),
                ),
        )
        .subcommand(Command::new("disconnect").about("Disconnect the interface"))
        .subcommand(
            Command::new("query")
                .about("Query an interface property")
                .arg(Arg::new("opcode").required(true).value_name("OPCODE")),
        )
        .subcommand(Command::new("scan").about("Request a scan").arg(ssid()))
        .subcommand(
            Command::new("config")
                .about("Configuration file helpers")
                .subcommand_required(true)
                .subcommand(
                    Command::new("generate").about("Write the default configuration").arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .value_name("FILE")
                            .help("Output file, stdout when omitted"),
                    ),
                )
                .subcommand(Command::new("validate").about("Validate the configuration"))
                .subcommand(Command::new("show").about("Print the effective configuration")),
        )
}

/// Initialize logging system
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| WifiError::Config(format!("Invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Load configuration, defaults when no file is given
fn load_configuration(path: Option<PathBuf>) -> Result<(WifiConfig, Option<PathBuf>)> {
    let Some(path) = path else {
        return Ok((WifiConfig::default(), None));
    };
    let config = WifiConfig::from_file(&path)?;
    config.validate()?;
    Ok((config, Some(path)))
}

/// Run `f` against the client on the blocking pool
async fn run_blocking<A, T, F>(client: &Arc<WlanClient<A>>, timeout: Duration, f: F) -> Result<T>
where
    A: WlanApi + 'static,
    T: Send + 'static,
    F: FnOnce(&WlanClient<A>) -> Result<T> + Send + 'static,
{
    let client = Arc::clone(client);
    let task = tokio::task::spawn_blocking(move || f(&client));
    tokio::time::timeout(timeout, task)
        .await
        .map_err(std::io::Error::from)?
        .map_err(std::io::Error::from)?
}

/// Print one value as text or JSON
fn emit<T: Serialize + Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Print a list as text blocks or one JSON array
fn emit_list<T: Serialize + Display>(items: &[T], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}\n", item);
        }
    }
    Ok(())
}

/// Parse a decimal or `0x` hex flag word
fn parse_flags(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| WifiError::InvalidParameter(format!("invalid connection flags '{}'", text)))
}

fn parse_mode(text: &str) -> Result<PresetMode> {
    match text {
        "profile" => Ok(PresetMode::Profile),
        "temporary_profile" => Ok(PresetMode::TemporaryProfile),
        "discovery_secure" => Ok(PresetMode::DiscoverySecure),
        "discovery_unsecure" => Ok(PresetMode::DiscoveryUnsecure),
        "auto" => Ok(PresetMode::Auto),
        other => Err(WifiError::InvalidParameter(format!("unknown connection mode '{}'", other))),
    }
}

fn optional<T>(matches: &ArgMatches, id: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = WifiError>,
{
    matches.get_one::<String>(id).map(|text| text.parse()).transpose()
}

/// Connection parameters from a preset or from the command line
fn connection_parameters(matches: &ArgMatches, config: &WifiConfig) -> Result<ConnectionParameters> {
    if let Some(name) = matches.get_one::<String>("preset") {
        let preset = config
            .preset(name)
            .ok_or_else(|| WifiError::InvalidParameter(format!("no network preset named '{}'", name)))?;
        return preset.to_parameters();
    }

    let profile = match matches.get_one::<String>("profile-file") {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => matches.get_one::<String>("profile").cloned(),
    };
    let mode = match matches.get_one::<String>("mode") {
        Some(mode) => parse_mode(mode)?,
        None if matches.contains_id("profile-file") => PresetMode::TemporaryProfile,
        None => PresetMode::Profile,
    };
    let bssids = matches
        .get_many::<String>("bssid")
        .into_iter()
        .flatten()
        .map(|text| text.parse::<MacAddress>())
        .collect::<Result<Vec<_>>>()?;

    let preset = NetworkPreset {
        name: "command line".to_string(),
        mode,
        profile,
        ssid: optional(matches, "ssid")?,
        bssids,
        bss_type: optional(matches, "bss-type")?.unwrap_or(BssType::Infrastructure),
        flags: matches.get_one::<String>("flags").map(|f| parse_flags(f)).transpose()?.unwrap_or(0),
    };
    preset.to_parameters()
}

/// Interfaces a command applies to
///
/// An explicit or configured GUID wins, otherwise every enumerated
/// interface is used.
async fn target_interfaces<A: WlanApi + 'static>(
    client: &Arc<WlanClient<A>>,
    matches: &ArgMatches,
    config: &WifiConfig,
    timeout: Duration,
) -> Result<Vec<Uuid>> {
    if let Some(text) = matches.get_one::<String>("interface") {
        let guid = Uuid::parse_str(text.trim_matches(|c| c == '{' || c == '}'))
            .map_err(|e| WifiError::InvalidParameter(format!("invalid interface GUID '{}': {}", text, e)))?;
        return Ok(vec![guid]);
    }
    if let Some(guid) = config.cli.default_interface {
        return Ok(vec![guid]);
    }

    let interfaces = run_blocking(client, timeout, |c| c.interfaces()).await?;
    if interfaces.is_empty() {
        return Err(WifiError::InvalidParameter("no wireless interface found".to_string()));
    }
    Ok(interfaces.into_iter().map(|interface| interface.guid).collect())
}

/// Single interface for commands that change state
async fn target_interface<A: WlanApi + 'static>(
    client: &Arc<WlanClient<A>>,
    matches: &ArgMatches,
    config: &WifiConfig,
    timeout: Duration,
) -> Result<Uuid> {
    let interfaces = target_interfaces(client, matches, config, timeout).await?;
    if interfaces.len() > 1 {
        warn!("{} interfaces found, using {}", interfaces.len(), interfaces[0]);
    }
    Ok(interfaces[0])
}

async fn run(matches: &ArgMatches, config: WifiConfig) -> Result<()> {
    if let Some(("config", sub)) = matches.subcommand() {
        return run_config(sub, &config);
    }

    let client = Arc::new(WlanClient::with_options(
        winwifi::wlanapi::NativeWlan::new(),
        config.client_options(),
    ));
    execute(&client, matches, &config).await
}

fn run_config(matches: &ArgMatches, config: &WifiConfig) -> Result<()> {
    match matches.subcommand() {
        Some(("generate", sub)) => {
            let defaults = WifiConfig::default();
            match sub.get_one::<String>("output") {
                Some(path) => {
                    defaults.to_file(path)?;
                    info!("Wrote default configuration to {}", path);
                }
                None => {
                    let text = toml::to_string_pretty(&defaults)
                        .map_err(|e| WifiError::Config(format!("Failed to serialize config: {}", e)))?;
                    print!("{}", text);
                }
            }
        }
        Some(("validate", _)) => {
            config.validate()?;
            println!("Configuration is valid");
        }
        Some(("show", _)) => println!("{}", config.to_json()?),
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}

/// Dispatch one client command
async fn execute<A: WlanApi + 'static>(
    client: &Arc<WlanClient<A>>,
    matches: &ArgMatches,
    config: &WifiConfig,
) -> Result<()> {
    let json = matches.get_flag("json") || config.cli.json;
    let timeout = Duration::from_secs(
        matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(config.session.timeout_secs),
    );

    match matches.subcommand() {
        Some(("interfaces", _)) => {
            let interfaces = run_blocking(client, timeout, |c| c.interfaces()).await?;
            info!("Found {} interfaces", interfaces.len());
            emit_list(&interfaces, json)
        }
        Some(("bss", sub)) => {
            let filter = match optional::<Ssid>(sub, "ssid")? {
                Some(ssid) => Some(BssFilter {
                    ssid,
                    bss_type: optional(sub, "bss-type")?.unwrap_or(BssType::Any),
                    security_enabled: sub.get_flag("secure"),
                }),
                None => None,
            };
            let mut entries = Vec::new();
            for guid in target_interfaces(client, matches, config, timeout).await? {
                let filter = filter.clone();
                entries.extend(
                    run_blocking(client, timeout, move |c| match &filter {
                        Some(filter) => c.bss_list_filtered(&guid, filter),
                        None => c.bss_list(&guid),
                    })
                    .await?,
                );
            }
            emit_list(&entries, json)
        }
        Some(("networks", _)) => {
            let mut networks = Vec::new();
            for guid in target_interfaces(client, matches, config, timeout).await? {
                networks.extend(run_blocking(client, timeout, move |c| c.available_networks(&guid)).await?);
            }
            emit_list(&networks, json)
        }
        Some(("profiles", _)) => {
            let mut profiles = Vec::new();
            for guid in target_interfaces(client, matches, config, timeout).await? {
                profiles.extend(run_blocking(client, timeout, move |c| c.profiles(&guid)).await?);
            }
            emit_list(&profiles, json)
        }
        Some(("profile", sub)) => {
            let name = sub.get_one::<String>("name").cloned().unwrap_or_default();
            let guid = target_interface(client, matches, config, timeout).await?;
            let profile = run_blocking(client, timeout, move |c| c.profile(&guid, &name)).await?;
            emit(&profile, json)
        }
        Some(("connect", sub)) => {
            let parameters = connection_parameters(sub, config)?;
            let guid = target_interface(client, matches, config, timeout).await?;
            info!("Connecting {} with {}", guid, parameters.mode());
            run_blocking(client, timeout, move |c| c.connect(&guid, &parameters)).await?;
            info!("Connection request accepted");
            Ok(())
        }
        Some(("disconnect", _)) => {
            let guid = target_interface(client, matches, config, timeout).await?;
            run_blocking(client, timeout, move |c| c.disconnect(&guid)).await?;
            info!("Disconnected {}", guid);
            Ok(())
        }
        Some(("query", sub)) => {
            let opcode = sub.get_one::<String>("opcode").cloned().unwrap_or_default();
            let guid = target_interface(client, matches, config, timeout).await?;
            let query = run_blocking(client, timeout, move |c| c.query_interface(&guid, &opcode)).await?;
            emit(&query, json)
        }
        Some(("scan", sub)) => {
            let ssid = optional::<Ssid>(sub, "ssid")?;
            let guid = target_interface(client, matches, config, timeout).await?;
            run_blocking(client, timeout, move |c| c.scan(&guid, ssid.as_ref())).await?;
            info!("Scan requested on {}", guid);
            Ok(())
        }
        Some((other, _)) => Err(WifiError::InvalidParameter(format!("unknown command '{}'", other))),
        None => Err(WifiError::InvalidParameter("no command given".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winwifi::wlanapi::mock::{interface_list, profile_list, InterfaceRecord, ProfileRecord};
    use winwifi::wlanapi::{MockWlan, Operation, ProfileDocument, Win32Error};

    fn guid() -> Uuid {
        Uuid::parse_str("6f9b3c1a-2d4e-4f60-8a1b-c2d3e4f5a6b7").unwrap()
    }

    fn mock() -> MockWlan {
        MockWlan::new()
            .with_interfaces(interface_list(&[InterfaceRecord {
                guid: guid(),
                description: "Wireless adapter".to_string(),
                state: 1,
            }]))
            .with_profile_list(guid(), profile_list(&[ProfileRecord { name: "home".to_string(), flags: 0 }]))
            .with_profile(
                guid(),
                "home",
                ProfileDocument {
                    xml: "<home/>".to_string(),
                    flags: 0,
                    granted_access: 0,
                },
            )
    }

    fn parse(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_load_without_config() {
        let (config, path) = load_configuration(None).unwrap();
        assert_eq!(config, WifiConfig::default());
        assert!(path.is_none());
    }

    #[test]
    fn test_load_missing_config() {
        assert!(matches!(
            load_configuration(Some(PathBuf::from("/nonexistent/winwifi.toml"))),
            Err(WifiError::Io(_))
        ));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags("0x11").unwrap(), 0x11);
        assert_eq!(parse_flags("16").unwrap(), 16);
        assert!(parse_flags("lots").is_err());
    }

    #[test]
    fn test_connection_parameters_from_args() {
        let matches = parse(&[
            "winwifi",
            "connect",
            "--mode",
            "discovery_secure",
            "--ssid",
            "cafe",
            "--bssid",
            "00:11:22:33:44:55",
            "--flags",
            "0x10",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let parameters = connection_parameters(sub, &WifiConfig::default()).unwrap();
        let request = parameters.to_request();
        assert_eq!(request.mode, 2);
        assert_eq!(request.ssid.as_deref(), Some(&b"cafe"[..]));
        assert_eq!(request.desired_bssids.len(), 1);
        assert_eq!(request.flags, 0x10);
    }

    #[test]
    fn test_connection_parameters_from_preset() {
        let mut config = WifiConfig::default();
        config.networks.push(NetworkPreset {
            name: "home".to_string(),
            mode: PresetMode::Profile,
            profile: Some("home".to_string()),
            ssid: None,
            bssids: Vec::new(),
            bss_type: BssType::Infrastructure,
            flags: 0,
        });

        let matches = parse(&["winwifi", "connect", "--preset", "home"]);
        let (_, sub) = matches.subcommand().unwrap();
        let parameters = connection_parameters(sub, &config).unwrap();
        assert_eq!(parameters.mode().profile(), Some("home"));

        let matches = parse(&["winwifi", "connect", "--preset", "office"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(matches!(
            connection_parameters(sub, &config),
            Err(WifiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_connect_without_profile_rejected() {
        let matches = parse(&["winwifi", "connect"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(matches!(
            connection_parameters(sub, &WifiConfig::default()),
            Err(WifiError::InvalidConnection(_))
        ));
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let client = Arc::new(WlanClient::new(mock()));
        let interfaces = run_blocking(&client, Duration::from_secs(5), |c| c.interfaces())
            .await
            .unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(client.api().open_handles(), 0);
    }

    #[tokio::test]
    async fn test_run_blocking_timeout() {
        let client = Arc::new(WlanClient::new(mock()));
        let result = run_blocking(&client, Duration::from_millis(10), |_| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(WifiError::Io(_))));
    }

    #[tokio::test]
    async fn test_target_interfaces() {
        let client = Arc::new(WlanClient::new(mock()));
        let config = WifiConfig::default();
        let timeout = Duration::from_secs(5);

        let matches = parse(&["winwifi", "interfaces"]);
        assert_eq!(target_interfaces(&client, &matches, &config, timeout).await.unwrap(), vec![guid()]);

        let matches = parse(&["winwifi", "--interface", "{00000000-0000-0000-0000-000000000001}", "disconnect"]);
        assert_eq!(
            target_interface(&client, &matches, &config, timeout).await.unwrap(),
            Uuid::from_u128(1)
        );
    }

    #[tokio::test]
    async fn test_execute_profiles() {
        let client = Arc::new(WlanClient::new(mock()));
        let matches = parse(&["winwifi", "--json", "profiles"]);
        execute(&client, &matches, &WifiConfig::default()).await.unwrap();
        assert_eq!(
            client.api().calls(),
            vec![
                Operation::OpenHandle,
                Operation::EnumInterfaces,
                Operation::CloseHandle,
                Operation::OpenHandle,
                Operation::GetProfileList,
                Operation::GetProfile,
                Operation::CloseHandle,
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_reports_native_failure() {
        let client = Arc::new(WlanClient::new(mock().failing(Operation::Disconnect, Win32Error::ACCESS_DENIED)));
        let matches = parse(&["winwifi", "disconnect"]);
        assert!(matches!(
            execute(&client, &matches, &WifiConfig::default()).await,
            Err(WifiError::OperationFailed { operation: Operation::Disconnect, .. })
        ));
    }
}
