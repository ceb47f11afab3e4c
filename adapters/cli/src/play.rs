use std::{
    io::{self, Write},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Args;
use margolus_core::{Command, Pacing};
use margolus_system_scheduler::{Clock, GridObserver, Session, SystemClock, Yield};
use margolus_world::{query, Automaton};
use tracing::{info, warn};

use crate::{
    config::{resolve_rule, BatchSetting, Config},
    pattern_transfer::PatternSnapshot,
};

/// Arguments for real-time playback.
#[derive(Args, Debug)]
pub(crate) struct PlayArgs {
    /// TOML file with grid, pacing, rule and animation settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of grid rows; overrides the config file.
    #[arg(long)]
    rows: Option<u32>,
    /// Number of grid columns; overrides the config file.
    #[arg(long)]
    columns: Option<u32>,
    /// Pattern transfer string to start from; sets size and rule.
    #[arg(long, conflicts_with_all = ["rows", "columns"])]
    pattern: Option<String>,
    /// Fill the grid randomly with this probability of a live cell.
    #[arg(long, conflicts_with = "pattern")]
    random: Option<f64>,
    /// Seed for the random fill.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Built-in rule name or hex transition table.
    #[arg(long)]
    rule: Option<String>,
    /// Ticks to run; negative runs backward.
    #[arg(long, allow_negative_numbers = true, default_value_t = 100)]
    ticks: i64,
    /// Run until interrupted instead of to a tick count.
    #[arg(long, conflicts_with_all = ["ticks", "animate"])]
    forever: bool,
    /// Run backward when running forever.
    #[arg(long, requires = "forever")]
    backward: bool,
    /// Play the animation from the config file.
    #[arg(long, requires = "config")]
    animate: bool,
    /// Target interval between frames in milliseconds.
    #[arg(long)]
    target_frame_millis: Option<u64>,
    /// Ceiling on ticking within one frame in milliseconds.
    #[arg(long)]
    max_update_millis: Option<u64>,
    /// Ticks per displayed frame, or `unbounded`.
    #[arg(long)]
    batch: Option<BatchSetting>,
    /// Print every notified frame as text.
    #[arg(long)]
    ascii: bool,
}

/// Prints the grid as text each time it is notified.
struct AsciiObserver;

impl GridObserver for AsciiObserver {
    fn grid_changed(&self, automaton: &Automaton) {
        let mut stdout = io::stdout().lock();
        let frame = query::render_text(automaton, '#', '.');
        if let Err(error) = writeln!(stdout, "Frame {}\n{frame}", automaton.frame_number()) {
            warn!(%error, "failed to print frame");
        }
    }
}

enum Outcome {
    Finished,
    Interrupted,
}

/// Builds the session, plays it on a timer and prints the final grid.
pub(crate) fn run(args: &PlayArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let mut session = Session::new(initial_automaton(args, &config)?, pacing(args, &config));
    config.register_rules(&mut session)?;

    if let Some(name) = &args.rule {
        let rule = resolve_rule(&mut session, name)?;
        let _ = session.apply(Command::SetRule { rule });
    }
    if let Some(probability) = args.random {
        let _ = session.apply(Command::FillRandom {
            probability,
            seed: args.seed,
        });
    }
    if args.ascii {
        let _ = session.add_observer(Rc::new(AsciiObserver));
    }

    let clock = SystemClock::new();
    let started = if args.animate {
        let animation = config.animation(&mut session)?;
        if animation.is_empty() {
            bail!("the config file does not define an animation");
        }
        session.run_animation(&animation, &clock)
    } else if args.forever {
        session.run_forever(args.backward)
    } else {
        session.run_for_ticks(args.ticks)
    };
    if !started {
        bail!("the run could not be started");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the playback runtime")?;
    let outcome = runtime.block_on(drive(&mut session, &clock))?;

    let automaton = session.automaton();
    match outcome {
        Outcome::Finished => info!(frame = automaton.frame_number(), "playback finished"),
        Outcome::Interrupted => info!(frame = automaton.frame_number(), "playback interrupted"),
    }
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Frame {} ({} live cells)",
        automaton.frame_number(),
        automaton.live_count()
    )?;
    writeln!(stdout, "{}", PatternSnapshot::capture(automaton).encode())?;
    Ok(())
}

/// Resumes the session whenever its requested suspension elapses until the
/// run stops or Ctrl-C arrives.
async fn drive<C>(session: &mut Session, clock: &C) -> Result<Outcome>
where
    C: Clock,
{
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let delay = match session.resume(clock) {
            Yield::Stopped => return Ok(Outcome::Finished),
            Yield::Suspend(delay) => delay,
        };
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            signal = &mut ctrl_c => {
                signal.context("failed to listen for ctrl-c")?;
                session.stop_running();
                let _ = session.resume(clock);
                return Ok(Outcome::Interrupted);
            }
        }
    }
}

fn initial_automaton(args: &PlayArgs, config: &Config) -> Result<Automaton> {
    if let Some(pattern) = &args.pattern {
        return PatternSnapshot::decode(pattern)
            .and_then(|snapshot| snapshot.to_automaton())
            .context("failed to load the pattern");
    }
    let rows = args.rows.unwrap_or(config.grid.rows);
    let columns = args.columns.unwrap_or(config.grid.columns);
    Automaton::new(rows, columns).with_context(|| format!("bad grid size {rows}x{columns}"))
}

fn pacing(args: &PlayArgs, config: &Config) -> Pacing {
    let defaults = config.pacing.pacing();
    Pacing {
        target_frame_time: args
            .target_frame_millis
            .map_or(defaults.target_frame_time, Duration::from_millis),
        max_update_time: args
            .max_update_millis
            .map_or(defaults.max_update_time, Duration::from_millis),
        batch_frame_count: args
            .batch
            .map_or(defaults.batch_frame_count, Into::into),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use margolus_core::BatchSize;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: PlayArgs,
    }

    fn parse(argv: &[&str]) -> Result<PlayArgs, clap::Error> {
        Harness::try_parse_from(std::iter::once("play").chain(argv.iter().copied()))
            .map(|harness| harness.args)
    }

    #[test]
    fn flags_override_config_values() {
        let config = Config::parse(
            "[grid]\nrows = 6\ncolumns = 8\n\
             [pacing]\ntarget_frame_millis = 50\nbatch_frame_count = 3\n",
        )
        .expect("config parses");
        let args = parse(&["--columns", "10", "--batch", "unbounded"]).expect("arguments parse");

        let automaton = initial_automaton(&args, &config).expect("valid dimensions");
        assert_eq!((automaton.rows(), automaton.columns()), (6, 10));

        let pacing = pacing(&args, &config);
        assert_eq!(pacing.target_frame_time, Duration::from_millis(50));
        assert_eq!(pacing.batch_frame_count, BatchSize::Unbounded);
    }

    #[test]
    fn pattern_sets_the_grid() {
        let mut source = Automaton::new(4, 6).expect("valid dimensions");
        source
            .toggle_cell(margolus_core::CellCoord::new(3, 5))
            .expect("cell in bounds");
        let encoded = PatternSnapshot::capture(&source).encode();

        let args = parse(&["--pattern", encoded.as_str()]).expect("arguments parse");
        let automaton = initial_automaton(&args, &Config::default()).expect("pattern loads");
        assert_eq!(automaton.cells(), source.cells());
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        assert!(parse(&["--forever", "--ticks", "5"]).is_err());
        assert!(parse(&["--backward"]).is_err());
        assert!(parse(&["--animate"]).is_err());
        assert!(parse(&["--pattern", "margolus:v1:2x2:", "--random", "0.5"]).is_err());
        assert!(parse(&["--ticks", "-20"]).is_ok());
    }

    #[test]
    fn driver_resumes_until_the_run_stops() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime builds");
        let mut session = Session::new(
            Automaton::new(4, 4).expect("valid dimensions"),
            Pacing {
                target_frame_time: Duration::from_millis(1),
                ..Pacing::default()
            },
        );
        assert!(session.run_for_ticks(-6));
        let clock = SystemClock::new();
        let outcome = runtime
            .block_on(drive(&mut session, &clock))
            .expect("run completes");

        assert!(matches!(outcome, Outcome::Finished));
        assert_eq!(session.automaton().frame_number(), -6);
        assert!(!session.scheduler().is_running());
    }
}
