use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use services::chat::ChatConfig;
use services::{AppServices, Clock};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};
use tutor_core::model::{CourseId, ExerciseId, LessonId, Locale};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLocale { raw: String },
    InvalidAnswer { raw: String },
    InvalidRate { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLocale { raw } => write!(f, "invalid --locale value: {raw}"),
            ArgsError::InvalidAnswer { raw } => write!(f, "invalid answer value: {raw}"),
            ArgsError::InvalidRate { raw } => write!(f, "invalid --rate value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- dashboard [--db <sqlite_url>] [--locale <en|ru|uz>]");
    eprintln!("  cargo run -p app -- courses   [--db <sqlite_url>] [--locale <en|ru|uz>]");
    eprintln!("  cargo run -p app -- study     --course <id> --lesson <id> [--rate <0.7-1.5>]");
    eprintln!("  cargo run -p app -- quiz      --course <id> --lesson <id> --answers <i,j,k>");
    eprintln!("  cargo run -p app -- exercises --course <id> --lesson <id> [--answer <exercise-id>=<text>]...");
    eprintln!("  cargo run -p app -- chat      --course <id> --lesson <id> --message <text>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://learner.sqlite3");
    eprintln!("  --locale en");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_LOCALE, LEARN_CHAT_BASE_URL, LEARN_CHAT_TIMEOUT_MS,");
    eprintln!("  LEARN_CHAT_BASIC_AUTH, LEARN_CHAT_BASIC_USER, LEARN_CHAT_BASIC_PASSWORD, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dashboard,
    Courses,
    Study,
    Quiz,
    Exercises,
    Chat,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "dashboard" => Some(Self::Dashboard),
            "courses" => Some(Self::Courses),
            "study" => Some(Self::Study),
            "quiz" => Some(Self::Quiz),
            "exercises" => Some(Self::Exercises),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }

    fn needs_lesson(self) -> bool {
        !matches!(self, Self::Dashboard | Self::Courses)
    }
}

struct Args {
    db_url: String,
    locale: Locale,
    course: Option<CourseId>,
    lesson: Option<LessonId>,
    rate: Option<f32>,
    answers: Vec<usize>,
    exercise_answers: Vec<(ExerciseId, String)>,
    message: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("LEARN_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://learner.sqlite3".into(), normalize_sqlite_url),
            locale: std::env::var("LEARN_LOCALE")
                .ok()
                .map_or(Locale::En, |tag| Locale::from_tag_or_default(&tag)),
            course: None,
            lesson: None,
            rate: None,
            answers: Vec::new(),
            exercise_answers: Vec::new(),
            message: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--locale" => {
                    let value = require_value(args, "--locale")?;
                    parsed.locale = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLocale { raw: value.clone() })?;
                }
                "--course" => parsed.course = Some(CourseId::new(require_value(args, "--course")?)),
                "--lesson" => parsed.lesson = Some(LessonId::new(require_value(args, "--lesson")?)),
                "--rate" => {
                    let value = require_value(args, "--rate")?;
                    parsed.rate = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidRate { raw: value.clone() })?,
                    );
                }
                "--answers" => {
                    let value = require_value(args, "--answers")?;
                    parsed.answers = value
                        .split(',')
                        .map(|part| part.trim().parse::<usize>())
                        .collect::<Result<_, _>>()
                        .map_err(|_| ArgsError::InvalidAnswer { raw: value.clone() })?;
                }
                "--answer" => {
                    let value = require_value(args, "--answer")?;
                    let (id, text) = value
                        .split_once('=')
                        .ok_or_else(|| ArgsError::InvalidAnswer { raw: value.clone() })?;
                    parsed
                        .exercise_answers
                        .push((ExerciseId::new(id.trim()), text.to_string()));
                }
                "--message" => parsed.message = Some(require_value(args, "--message")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn lesson_target(&self) -> Result<(CourseId, LessonId), ArgsError> {
        let course = self
            .course
            .clone()
            .ok_or(ArgsError::MissingFlag { flag: "--course" })?;
        let lesson = self
            .lesson
            .clone()
            .ok_or(ArgsError::MissingFlag { flag: "--lesson" })?;
        Ok((course, lesson))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => Command::Dashboard,
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv)
        .and_then(|args| {
            if cmd.needs_lesson() {
                args.lesson_target()?;
            }
            Ok(args)
        })
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    let chat = ChatConfig::from_env()?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.locale, chat).await?;
    let store = services.store();

    match cmd {
        Command::Dashboard => {
            let summary = store.dashboard();
            println!("Enrolled courses:  {}", summary.enrolled_courses);
            println!("Completed lessons: {}", summary.completed_lessons);
            println!("Average score:     {}", summary.average_score);
            println!("Quiz attempts:     {}", summary.attempts);
            for (course_id, progress) in summary.courses {
                println!(
                    "  {:<24} {:>3}%  ({}/{})",
                    course_id.as_str(),
                    progress.percentage, progress.completed, progress.total
                );
            }
        }
        Command::Courses => {
            for course in store.courses() {
                let progress = store.course_progress(&course.id);
                println!(
                    "{:<24} {:<16} {:>3}%  {}",
                    course.id.as_str(),
                    format!("{:?}", course.category),
                    progress.percentage,
                    course.title
                );
                for lesson in &course.lessons {
                    println!("    {}  {}", lesson.id, lesson.title);
                }
            }
        }
        Command::Study => {
            let (course_id, lesson_id) = parsed.lesson_target()?;
            let mut view = services
                .open_lesson(&course_id, &lesson_id)
                .await
                .ok_or("lesson not found")?;
            if let Some(rate) = parsed.rate {
                view.set_rate(rate);
            }
            println!("{}", view.lesson().title);
            view.start();

            let mut revealed = view.timer().subscribe();
            let mut printed = 0;
            loop {
                let lines = view.visible_lines();
                for line in lines.iter().skip(printed) {
                    println!("  {line}");
                }
                printed = lines.len();
                if view.is_complete() {
                    break;
                }
                if tokio::time::timeout(Duration::from_secs(10), revealed.changed())
                    .await
                    .is_err()
                {
                    break;
                }
            }
            println!("Progress: {}%", view.progress_percent());
        }
        Command::Quiz => {
            let (course_id, lesson_id) = parsed.lesson_target()?;
            let lesson = store
                .lesson(&course_id, &lesson_id)
                .ok_or("lesson not found")?;
            let answers: HashMap<String, usize> = lesson
                .quiz
                .questions
                .iter()
                .zip(&parsed.answers)
                .map(|(question, selected)| (question.id().to_string(), *selected))
                .collect();
            let outcome = store
                .submit_quiz(&course_id, &lesson_id, &answers)
                .await
                .ok_or("lesson not found")?;
            println!(
                "Score {}/{} ({})",
                outcome.attempt.score,
                outcome.attempt.max_score,
                if outcome.passed { "passed" } else { "not passed" }
            );
            if let Some(average) = outcome.average_score {
                println!("Course average: {average}");
            }
            println!("Course progress: {}%", store.course_progress(&course_id).percentage);
        }
        Command::Exercises => {
            let (course_id, lesson_id) = parsed.lesson_target()?;
            let answers = parsed
                .exercise_answers
                .iter()
                .map(|(id, text)| (id, text.as_str()));
            if !store.submit_exercises(&course_id, &lesson_id, answers).await {
                return Err("lesson not found".into());
            }
            println!("Saved exercise answers for {lesson_id}");
        }
        Command::Chat => {
            let (course_id, lesson_id) = parsed.lesson_target()?;
            let message = parsed
                .message
                .clone()
                .ok_or(ArgsError::MissingFlag { flag: "--message" })?;
            let mut view = services
                .open_lesson(&course_id, &lesson_id)
                .await
                .ok_or("lesson not found")?;
            view.start();
            match view.ask(&message).await {
                Ok(reply) => println!("{reply}"),
                Err(e) => {
                    tracing::warn!(error = %e, "tutor request failed");
                    eprintln!("{}", e.user_message());
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
