/*
    Import a state machine from a CSV bundle and plan coverage test walks.

    The transition matrix file is required; <prefix>_states.csv,
    <prefix>_events.csv and <prefix>_output.csv are picked up automatically
    when they sit next to it. The planned walks are printed and saved as a
    timestamped JSON file.
*/

use fsm_probe::importer::FsmImporter;
use fsm_probe::strategy::{EdgeCover, NodeCover, Strategy};
use fsm_probe::util;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum Coverage {
    Node,
    Edge,
}
impl FromStr for Coverage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "n" | "node" | "nodes" => Ok(Coverage::Node),
            "e" | "edge" | "edges" => Ok(Coverage::Edge),
            _ => Err(format!("Could not parse as Coverage: {}", s)),
        }
    }
}
impl Coverage {
    fn label(&self) -> &'static str {
        match self {
            Coverage::Node => "node",
            Coverage::Edge => "edge",
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "plan cover",
    about = "Plan coverage test walks over a state machine imported from CSV."
)]
struct Args {
    // e.g. "machine.csv"
    transitions: PathBuf,
    // e.g. "Idle"
    start: String,

    #[structopt(short, long, default_value = "node")]
    coverage: Coverage,

    // seed for the edge cover's random edge choice
    #[structopt(short, long)]
    seed: Option<u64>,

    #[structopt(short, long, default_value = "plans")]
    out_dir: String,
}
impl Args {
    fn run(self) {
        let prefix = {
            let text = self.transitions.to_string_lossy();
            text.strip_suffix(".csv").unwrap_or(&text).to_string()
        };
        let side_file = |suffix: &str| {
            let path = PathBuf::from(format!("{}_{}.csv", prefix, suffix));
            util::file_exists(&path).then_some(path)
        };
        let states = side_file("states");
        let events = side_file("events");
        let outputs = side_file("output");

        let graph = FsmImporter::new()
            .from_csv(
                &self.transitions,
                states.as_deref(),
                events.as_deref(),
                outputs.as_deref(),
            )
            .unwrap_or_else(|err| {
                panic!(
                    "Could not import state machine from {:?} -- {}",
                    self.transitions, err
                )
            });
        println!(
            "Imported {} states and {} transitions",
            graph.vertex_count(),
            graph.arc_count()
        );

        let mut strategy: Box<dyn Strategy> = match self.coverage {
            Coverage::Node => Box::new(NodeCover::new()),
            Coverage::Edge => Box::new(match self.seed {
                Some(seed) => EdgeCover::with_seed(false, seed),
                None => EdgeCover::new(false),
            }),
        };
        strategy
            .travel(&graph, &self.start)
            .unwrap_or_else(|err| panic!("Could not plan walks -- {}", err));

        println!("======= Planned walks =======");
        print!("{}", strategy.tracks());

        std::fs::create_dir_all(&self.out_dir).unwrap_or_else(|err| {
            panic!("Could not create directory {:?} -- {}", self.out_dir, err)
        });
        let filepath = format!(
            "{}/{}_{}.json",
            self.out_dir,
            util::current_datetime_str(),
            self.coverage.label()
        );
        util::to_json_file(&filepath, strategy.walks());
        println!("Plan saved to: {}", filepath);
    }
}

fn main() {
    env_logger::init();
    Args::from_args().run();
}
