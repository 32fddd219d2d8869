//! Quest Runner - walks a quest script from the terminal.
//!
//! There is no presentation layer here, so widgets are simulated by hand:
//! `flag` and `grade` mount a manual widget under the given name the first
//! time it is mentioned, which is enough to open gates and grade submissions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};
use clap::Parser;
use quest_engine::{CompletionFlags, Interaction, InteractionGrade, InteractionHandle, QuestSession};
use quest_script::{BranchRef, ControlKind, EngineConfig, EventPayload, Position, Quest};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  next | back | submit | restart
  jump SCENE DIALOG
  flag WIDGET CONDITION
  grade WIDGET correct|incorrect|empty
  state WIDGET KEY VALUE
  drop WIDGET
  pos | widgets | branches | shared | help | quit";

#[derive(Parser, Debug)]
#[command(name = "quest-runner")]
#[command(about = "Walk a quest script interactively")]
struct Cli {
    /// Path to a quest script (JSON)
    script: PathBuf,

    /// Path to an engine config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start at a scene and dialog index instead of the first step
    #[arg(long, num_args = 2, value_names = ["SCENE", "DIALOG"])]
    at: Option<Vec<usize>>,
}

/// Stand-in widget driven from the command line.
#[derive(Debug, Default)]
struct ManualInteraction {
    state: Map<String, Value>,
    flags: CompletionFlags,
    grade: Option<InteractionGrade>,
}

impl Interaction for ManualInteraction {
    fn apply_event(&mut self, payload: &EventPayload) {
        for (key, value) in &payload.fields {
            self.state.insert(key.clone(), value.clone());
        }
        let fields = serde_json::Value::Object(payload.fields.clone());
        tracing::info!(
            interaction = %payload.target,
            fields = %fields,
            "Widget received event"
        );
    }

    fn completion_flags(&self) -> CompletionFlags {
        self.flags.clone()
    }

    fn grade(&self) -> Option<InteractionGrade> {
        self.grade
    }
}

struct Runner {
    session: QuestSession,
    // Strong handles; the registry only holds weak ones.
    widgets: HashMap<String, Rc<RefCell<ManualInteraction>>>,
}

impl Runner {
    fn new(session: QuestSession) -> Self {
        Self {
            session,
            widgets: HashMap::new(),
        }
    }

    /// Get the named widget, mounting it on first use.
    fn widget(&mut self, name: &str) -> Rc<RefCell<ManualInteraction>> {
        if let Some(widget) = self.widgets.get(name) {
            return widget.clone();
        }
        let widget = Rc::new(RefCell::new(ManualInteraction::default()));
        let handle: InteractionHandle = widget.clone();
        self.session.registry_mut().register(name, &handle);
        self.widgets.insert(name.to_string(), widget.clone());
        widget
    }

    /// Run one command line. Returns `false` when the learner quits.
    fn execute(&mut self, line: &str) -> anyhow::Result<bool> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["quit" | "exit"] => return Ok(false),
            ["help"] => println!("{HELP}"),
            ["next"] => println!("{}", serde_json::to_string(&self.session.next())?),
            ["back"] => println!("{}", serde_json::to_string(&self.session.back())?),
            ["submit"] => println!("{}", serde_json::to_string(&self.session.submit())?),
            ["restart"] => {
                self.session.restart();
                self.print_position();
            }
            ["jump", scene, dialog] => {
                let position = Position::new(
                    scene.parse().context("scene index must be a number")?,
                    dialog.parse().context("dialog index must be a number")?,
                );
                let transition = self.session.jump_to(position)?;
                println!("{}", serde_json::to_string(&transition)?);
            }
            ["flag", widget, condition] => {
                self.widget(widget).borrow_mut().flags.set(*condition, true);
                println!("{widget}: {condition} = true");
            }
            ["grade", widget, grade] => {
                let grade = match *grade {
                    "correct" => InteractionGrade::correct(),
                    "incorrect" => InteractionGrade::incorrect(),
                    "empty" => InteractionGrade::empty(),
                    other => bail!("unknown grade '{other}'"),
                };
                self.widget(widget).borrow_mut().grade = Some(grade);
                println!("{widget}: {}", serde_json::to_string(&grade)?);
            }
            ["state", widget, key, value] => {
                let value = serde_json::from_str(value)
                    .unwrap_or_else(|_| Value::String(value.to_string()));
                let mut state = Map::new();
                state.insert(key.to_string(), value);
                if !self.session.exchange_state(widget, &state) {
                    println!("{widget}: state not shared");
                }
            }
            ["drop", widget] => {
                self.widgets.remove(*widget);
                if !self.session.registry_mut().unregister(widget) {
                    println!("{widget} was not mounted");
                }
            }
            ["pos"] => self.print_position(),
            ["widgets"] => {
                for name in self.session.registry().registered_names() {
                    let flags = self.session.registry().read_completion_flags(name);
                    println!("{name}: {}", serde_json::to_string(&flags)?);
                }
            }
            ["branches"] => {
                let branches = self.session.branches();
                for (point, choice) in branches.map().points().iter().enumerate() {
                    for (branch, path) in choice.branches.iter().enumerate() {
                        let done = branches.is_completed(BranchRef { point, branch });
                        println!("{} -> {path}{}", choice.root, if done { " (done)" } else { "" });
                    }
                }
            }
            ["shared"] => {
                let position = self.session.current_position();
                let shared = self.session.shared_state().get(position).cloned();
                println!("{}", Value::Object(shared.unwrap_or_default()));
            }
            _ => bail!("unknown command '{line}', try 'help'"),
        }
        Ok(true)
    }

    fn print_position(&self) {
        let scene = self.session.current_scene();
        let progress = self.session.progress();
        println!(
            "at {} ({:?}{}) {}% {:?}",
            self.session.current_position(),
            scene.kind,
            scene
                .name
                .as_deref()
                .map(|name| format!(" '{name}'"))
                .unwrap_or_default(),
            progress.percent,
            self.session.status(),
        );
        let step = self.session.current_step();
        let controls: Vec<String> = [
            ControlKind::Start,
            ControlKind::Back,
            ControlKind::Next,
            ControlKind::Submit,
        ]
        .into_iter()
        .filter(|kind| step.allows(*kind))
        .map(|kind| format!("{kind:?}").to_lowercase())
        .collect();
        println!("  controls: {}", controls.join(", "));
        for gate in step.gates() {
            println!(
                "  gate '{}' on {}",
                gate.condition,
                gate.target.as_deref().unwrap_or("<none>")
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let quest = Quest::from_path(&cli.script)
        .with_context(|| format!("failed to load quest {}", cli.script.display()))?;
    tracing::info!(
        quest = %quest.slug,
        scenes = quest.scene_count(),
        steps = quest.total_steps(),
        "Quest loaded"
    );

    let position = match cli.at.as_deref() {
        Some(&[scene, dialog]) => (scene, dialog).into(),
        _ => Position::origin(),
    };
    let session = QuestSession::start_at(quest, &config, position)?;
    let mut runner = Runner::new(session);
    runner.print_position();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match runner.execute(line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gated_runner() -> Runner {
        let quest = Quest::from_json_str(
            "gated",
            &json!([
                {
                    "type": "one-at-a-time",
                    "dialogs": [
                        {
                            "interactions": [
                                { "name": "sim", "config": "sim", "enableStateExchange": true }
                            ],
                            "events": [{
                                "payload": {
                                    "target": "sim",
                                    "disabled": "angle-set",
                                    "angle": 30
                                },
                                "triggers": ["on-next"]
                            }]
                        },
                        {}
                    ]
                }
            ])
            .to_string(),
        )
        .unwrap();
        Runner::new(QuestSession::with_defaults(quest).unwrap())
    }

    #[test]
    fn test_flag_opens_gate() {
        let mut runner = gated_runner();

        assert!(runner.execute("next").unwrap());
        assert_eq!(runner.session.current_position(), Position::origin());

        assert!(runner.execute("flag sim angle-set").unwrap());
        assert!(runner.execute("next").unwrap());
        assert_eq!(runner.session.current_position(), Position::new(0, 1));

        let sim = runner.widget("sim");
        assert_eq!(sim.borrow().state.get("angle"), Some(&json!(30)));

        assert!(runner.execute("back").unwrap());
        assert_eq!(runner.session.current_position(), Position::origin());
    }

    #[test]
    fn test_drop_closes_gate_again() {
        let mut runner = gated_runner();
        runner.execute("flag sim angle-set").unwrap();

        runner.execute("drop sim").unwrap();
        assert!(runner.widgets.is_empty());
        runner.execute("next").unwrap();

        assert_eq!(runner.session.current_position(), Position::origin());
    }

    #[test]
    fn test_state_command_shares_widget_state() {
        let mut runner = gated_runner();

        runner.execute("state sim angle 45").unwrap();
        runner.execute("state sim label tilted").unwrap();

        let shared = runner.session.shared_state().get(Position::origin()).unwrap();
        assert_eq!(shared.get("angle"), Some(&json!(45)));
        assert_eq!(shared.get("label"), Some(&json!("tilted")));
    }

    #[test]
    fn test_rejects_bad_commands() {
        let mut runner = gated_runner();

        assert!(runner.execute("fly").is_err());
        assert!(runner.execute("grade sim perfect").is_err());
        assert!(runner.execute("jump one 0").is_err());
        assert!(runner.execute("jump 9 0").is_err());
        assert!(runner.execute("").unwrap());
        assert!(!runner.execute("quit").unwrap());
    }
}
