use clap::Parser;
use enum_iterator::all;
use log::*;
#[cfg(debug_assertions)]
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::{
    append::rolling_file::{
        RollingFileAppender,
        policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use refbox::{
    command::Command,
    config::Config,
    console::Console,
    tournament_manager::{TournamentManager, penalty::PenaltyBook, schedule::SystemClock},
};
use std::{path::PathBuf, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{Instant, MissedTickBehavior},
};
use uwh_common::color::Color;

const APP_NAME: &str = "refbox";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long, default_value = "100")]
    /// Milliseconds between clock updates
    tick_ms: u64,

    #[clap(long)]
    /// Directory within which log files will be placed, default is platform dependent
    log_location: Option<PathBuf>,

    #[clap(long, default_value = "5000000")]
    /// Max size in bytes that a log file is allowed to reach before being rolled over
    log_max_file_size: u64,

    #[clap(long, default_value = "3")]
    /// Number of archived logs to keep
    num_old_logs: u32,
}

fn init_logging(args: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_base_path = match args.log_location.clone() {
        Some(path) => path,
        None => {
            let mut path = directories::BaseDirs::new()
                .ok_or("Could not find a directory to store logs")?
                .data_local_dir()
                .to_path_buf();
            path.push("uwh-refbox-logs");
            path
        }
    };
    let mut log_path = log_base_path.clone();
    let mut archived_log_path = log_base_path;
    log_path.push(format!("{APP_NAME}-log.txt"));
    archived_log_path.push(format!("{APP_NAME}-log-{{}}.txt.gz"));

    #[cfg(debug_assertions)]
    eprintln!("Log path: {}", log_path.display());

    // Only log to the console in debug mode
    #[cfg(debug_assertions)]
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    // Setup the file log roller
    let roller = FixedWindowRoller::builder().build(
        archived_log_path
            .to_str()
            .ok_or("The log path is not valid unicode")?,
        args.num_old_logs,
    )?;
    let file_policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(args.log_max_file_size)),
        Box::new(roller),
    );
    let file_appender = RollingFileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new("[{d} {l:5} {M}] {m}{n}")))
        .build(log_path, Box::new(file_policy))?;

    // Setup the logging from all locations to use `LevelFilter::Error`
    let root = Root::builder().appender("file_appender");
    #[cfg(debug_assertions)]
    let root = root.appender("console");
    let root = root.build(LevelFilter::Error);

    // Setup the top level logging config
    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("file_appender", Box::new(file_appender)));

    #[cfg(debug_assertions)]
    let log_config = log_config.appender(Appender::builder().build("console", Box::new(console)));

    let log_config = log_config
        .logger(Logger::builder().build(APP_NAME, log_level)) // Setup the logging from the refbox crate to use `log_level`
        .build(root)?;

    log4rs::init_config(log_config)?;
    log_panics::init();
    Ok(())
}

fn load_config() -> Config {
    match confy::get_configuration_file_path(APP_NAME, None) {
        Ok(path) => info!("Reading config file from {path:?}"),
        Err(e) => warn!("Could not find the config file path: {e}"),
    }

    let config = match confy::load::<Config>(APP_NAME, None) {
        Ok(c) => match c.validate() {
            Ok(()) => return c,
            Err(e) => {
                warn!("Config file is invalid, overwriting with default. Error: {e}");
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config file, overwriting with default. Error: {e}");
            Config::default()
        }
    };

    if let Err(e) = confy::store(APP_NAME, None, &config) {
        error!("Failed to write the default config file: {e}");
    }
    config
}

fn print_status(console: &Console<PenaltyBook>) {
    let tm = console.manager();
    let secs = tm.game_clock_time().as_secs();
    let mut line = format!(
        "[{}] {} {}:{:02} | Black {} - {} White",
        console.state(),
        tm.status_label(),
        secs / 60,
        secs % 60,
        tm.scores().black,
        tm.scores().white,
    );
    if let Some(kind) = tm.timeout_kind() {
        line.push_str(&format!(" | {kind}"));
        if let Some(timeout) = tm.timeout_clock_time() {
            line.push_str(&format!(" {}", timeout.as_secs()));
        }
    }
    for color in all::<Color>() {
        for pen in tm.penalties().list(color) {
            line.push_str(&format!(
                " | {color} #{} {}",
                pen.player_number(),
                pen.printable_time()
            ));
        }
    }
    println!("{line}");
}

fn handle_command(console: &mut Console<PenaltyBook>, command: Command) {
    debug!("Handling operator command {command:?}");
    match command {
        Command::Button(requested) => {
            console.on_primary_button(requested);
        }
        Command::BeginEdit => console.begin_clock_edit(),
        Command::EditClock(time) => console.on_manual_clock_edit(time),
        Command::CancelEdit => console.cancel_clock_edit(),
        Command::Score(color, player) => console.manager_mut().add_score(color, player),
        Command::Penalty(color, player, kind) => {
            console.manager_mut().start_penalty(color, player, kind)
        }
        Command::Status | Command::Quit => {}
    }
    print_status(console);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    init_logging(&args)?;
    info!("Starting RefBox");

    let config = load_config();
    if let Ok(offset) = time::UtcOffset::current_local_offset() {
        if offset != config.schedule.timezone {
            warn!(
                "The timezone in the config file ({}) does not match the detected system \
                 timezone ({offset}). The config timezone will be used.",
                config.schedule.timezone
            );
        }
    }

    let tm = TournamentManager::with_collaborators(
        config.game,
        PenaltyBook::default(),
        Box::new(SystemClock),
        Box::new(config.schedule),
    );
    let mut buzzer_rx = tm.get_buzzer_rx();
    let mut start_stop_rx = tm.get_start_stop_rx();
    let mut console = Console::new(tm);

    let mut interval = tokio::time::interval(Duration::from_millis(args.tick_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_status(&console);
    loop {
        tokio::select! {
            now = interval.tick() => {
                console.on_tick(now - last_tick);
                last_tick = now;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, exiting");
                    break;
                };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => {
                        info!("Operator asked to quit");
                        break;
                    }
                    Ok(command) => handle_command(&mut console, command),
                    Err(e) => {
                        warn!("Could not understand `{line}`: {e}");
                        println!("{e}");
                    }
                }
            }
            Ok(()) = buzzer_rx.changed() => {
                buzzer_rx.borrow_and_update();
                println!("*** BUZZER ***");
                print_status(&console);
            }
            Ok(()) = start_stop_rx.changed() => {
                let running = *start_stop_rx.borrow_and_update();
                debug!("Clock running changed to {running}");
            }
        }
    }

    if let Some(stats) = console.manager().last_game_stats() {
        match stats.as_json() {
            Ok(json) => info!("Last game stats: {json}"),
            Err(e) => error!("Failed to serialize game stats: {e}"),
        }
    }

    Ok(())
}
