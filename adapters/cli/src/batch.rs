use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use margolus_core::{CellCoord, Command, Event, Pacing};
use margolus_system_scheduler::Session;
use margolus_world::Automaton;

use crate::config::resolve_rule;

/// Arguments for stepping a pattern between two frames without a timer.
#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Number of grid rows (positive, even).
    #[arg(long)]
    rows: u32,
    /// Number of grid columns (positive, even).
    #[arg(long)]
    columns: u32,
    /// Frame number assigned to the input pattern.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,
    /// Frame number to run to; runs backward when below `start`.
    #[arg(long, allow_negative_numbers = true)]
    end: i64,
    /// Also print the cells at every frame divisible by this count.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    checkpoint: Option<u64>,
    /// Built-in rule name or hex transition table.
    #[arg(long, default_value = "critters")]
    rule: String,
}

/// Reads `[[row, column], ...]` from `input` and writes the cells at every
/// checkpoint and at the end frame.
pub(crate) fn run(args: &BatchArgs, input: &str, out: &mut impl Write) -> Result<()> {
    if args.start == args.end {
        bail!("start and end frames are equal ({})", args.start);
    }
    let checkpoint = args
        .checkpoint
        .map(i64::try_from)
        .transpose()
        .context("checkpoint interval is too large")?;

    let automaton = Automaton::new(args.rows, args.columns)
        .with_context(|| format!("bad grid size {}x{}", args.rows, args.columns))?;
    let mut session = Session::new(automaton, Pacing::default());
    let rule = resolve_rule(&mut session, &args.rule)?;

    let cells: Vec<CellCoord> =
        serde_json::from_str(input).context("failed to parse input cells as JSON")?;

    for command in [
        Command::SetRule { rule },
        Command::SetCells {
            cells,
            enabled: true,
        },
        Command::SetFrameNumber { frame: args.start },
        Command::SetReversed {
            reversed: args.end < args.start,
        },
    ] {
        for event in session.apply(command) {
            if let Event::CommandRejected { reason } = event {
                return Err(reason).context("input pattern rejected");
            }
        }
    }

    while session.automaton().frame_number() != args.end {
        let _ = session.apply(Command::Tick);
        let frame = session.automaton().frame_number();
        let at_checkpoint = checkpoint.is_some_and(|every| frame.rem_euclid(every) == 0);
        if frame == args.end || at_checkpoint {
            if checkpoint.is_some() {
                writeln!(out, "Frame {frame}")?;
            }
            let json = serde_json::to_string(&session.active_cells())
                .context("failed to serialise active cells")?;
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BatchArgs,
    }

    fn args(argv: &[&str]) -> BatchArgs {
        Harness::try_parse_from(std::iter::once("batch").chain(argv.iter().copied()))
            .expect("arguments parse")
            .args
    }

    fn output(args: &BatchArgs, input: &str) -> String {
        let mut out = Vec::new();
        run(args, input, &mut out).expect("batch runs");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn forward_then_backward_restores_the_input() {
        let input = "[[1,1],[1,2],[2,2],[5,0]]";
        let forward = output(
            &args(&["--rows", "6", "--columns", "8", "--end", "9"]),
            input,
        );
        assert_eq!(forward.lines().count(), 1);

        let backward = output(
            &args(&["--rows", "6", "--columns", "8", "--start", "9", "--end", "0"]),
            forward.trim(),
        );
        assert_eq!(backward.trim(), "[[1,1],[1,2],[2,2],[5,0]]");
    }

    #[test]
    fn checkpoints_are_labelled_with_their_frame() {
        let text = output(
            &args(&[
                "--rows",
                "4",
                "--columns",
                "4",
                "--start",
                "-3",
                "--end",
                "4",
                "--checkpoint",
                "2",
                "--rule",
                "0123456789ABCDEF",
            ]),
            "[[0,0]]",
        );
        let frames: Vec<_> = text.lines().filter(|line| line.starts_with("Frame")).collect();
        assert_eq!(frames, ["Frame -2", "Frame 0", "Frame 2", "Frame 4"]);
        assert!(text.lines().filter(|line| line.starts_with('[')).all(|line| line == "[[0,0]]"));
    }

    #[test]
    fn rejects_bad_requests() {
        let mut sink = Vec::new();
        let equal = args(&["--rows", "4", "--columns", "4", "--start", "2", "--end", "2"]);
        assert!(run(&equal, "[]", &mut sink).is_err());

        let odd = args(&["--rows", "5", "--columns", "4", "--end", "2"]);
        assert!(run(&odd, "[]", &mut sink).is_err());

        let outside = args(&["--rows", "4", "--columns", "4", "--end", "2"]);
        assert!(run(&outside, "[[4,0]]", &mut sink).is_err());

        let unknown = args(&[
            "--rows", "4", "--columns", "4", "--end", "2", "--rule", "glider",
        ]);
        assert!(run(&unknown, "[]", &mut sink).is_err());
        assert!(sink.is_empty());

        assert!(Harness::try_parse_from([
            "batch",
            "--rows",
            "4",
            "--columns",
            "4",
            "--end",
            "2",
            "--checkpoint",
            "0",
        ])
        .is_err());
    }
}
