//! Interactive loops for each mode, driven by lines from stdin.

use std::error::Error;
use std::io::Write;

use quiz_core::model::{TickOutcome, TimerToken};
use services::{
    AnswerFeedback, AppServices, ArcadeOutcome, ArcadeRun, QuizKind, QuizSession, SessionError,
    SpeedRound,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Duration, Instant};

use crate::render;

type PlayResult = Result<(), Box<dyn Error>>;

const QUIT: &str = ":q";
const HINT: &str = ":h";

pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `text` without a newline and wait for one line. `None` on EOF.
    pub async fn ask(&mut self, text: &str) -> std::io::Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        self.next_line().await
    }

    /// Cancel safe; used inside `select!`.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn confirm(&mut self, text: &str) -> std::io::Result<bool> {
        let answer = self.ask(text).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }
}

fn no_material(kind: &str) {
    if kind == QuizKind::WeakSpot.as_str() {
        println!("Nothing to drill: no question needs practice right now. Nice work!");
    } else {
        println!("No questions available for {kind}.");
    }
}

fn parse_choice(line: &str, len: usize) -> Option<usize> {
    line.parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

//
// ─── QUIZ / FLASHCARDS / TYPED / WEAK SPOT ─────────────────────────────────────
//

pub async fn run_quiz(
    services: &mut AppServices,
    prompt: &mut Prompt,
    kind: QuizKind,
    count: Option<usize>,
) -> PlayResult {
    let mut session = match QuizSession::start(services.progress(), kind, count) {
        Ok(session) => session,
        Err(SessionError::NoMaterial) => {
            no_material(kind.as_str());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    println!("{kind}: {HINT} for a hint, {QUIT} to stop.");

    loop {
        let quit = play_questions(services, prompt, &mut session).await?;
        println!(
            "{}",
            render::session_summary(kind, session.score(), session.improvement_rate())
        );
        if quit || !prompt.confirm("Play again? [y/N] ").await? {
            break;
        }
        match session.restart(services.progress()) {
            Ok(()) => {}
            Err(SessionError::NoMaterial) => {
                no_material(kind.as_str());
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    println!("\n{}", render::dashboard(&services.progress().snapshot()));
    Ok(())
}

/// Returns `true` if the learner quit early.
async fn play_questions(
    services: &mut AppServices,
    prompt: &mut Prompt,
    session: &mut QuizSession,
) -> Result<bool, Box<dyn Error>> {
    loop {
        let Some(question) = session.current() else {
            return Ok(false);
        };
        println!("{}", render::question_header(session.progress(), question));

        let feedback = match session.kind() {
            QuizKind::MultipleChoice | QuizKind::WeakSpot => {
                answer_with_options(services, prompt, session).await?
            }
            QuizKind::Flashcards => grade_flashcard(services, prompt, session).await?,
            QuizKind::TypedAnswer => answer_typed(services, prompt, session).await?,
        };
        let Some(feedback) = feedback else {
            return Ok(true);
        };
        println!("{}", render::feedback(&feedback));
        session.advance()?;
    }
}

fn show_hint(session: &mut QuizSession) {
    match session.reveal_hint() {
        Ok("") => println!("  (no hint for this one)"),
        Ok(hint) => println!("  Hint: {hint}"),
        Err(_) => {}
    }
}

async fn answer_with_options(
    services: &mut AppServices,
    prompt: &mut Prompt,
    session: &mut QuizSession,
) -> Result<Option<AnswerFeedback>, Box<dyn Error>> {
    let len = match session.options() {
        Some(options) => {
            println!("{}", render::options(options));
            options.len()
        }
        None => return Ok(None),
    };
    loop {
        let Some(line) = prompt.ask("> ").await? else {
            return Ok(None);
        };
        match line.as_str() {
            QUIT => return Ok(None),
            HINT => show_hint(session),
            raw => match parse_choice(raw, len) {
                Some(index) => {
                    let feedback = session.answer_option(services.progress_mut(), index).await?;
                    return Ok(Some(feedback));
                }
                None => println!("  Pick a number from 1 to {len}."),
            },
        }
    }
}

async fn grade_flashcard(
    services: &mut AppServices,
    prompt: &mut Prompt,
    session: &mut QuizSession,
) -> Result<Option<AnswerFeedback>, Box<dyn Error>> {
    while !session.is_flipped() {
        let Some(line) = prompt.ask("(Enter to flip) ").await? else {
            return Ok(None);
        };
        match line.as_str() {
            QUIT => return Ok(None),
            HINT => show_hint(session),
            _ => session.flip()?,
        }
    }
    if let Some(question) = session.current() {
        println!("  Answer: {}", question.correct_answer());
    }
    loop {
        let Some(line) = prompt.ask("Did you know it? [y/n] ").await? else {
            return Ok(None);
        };
        let knew = match line.to_ascii_lowercase().as_str() {
            QUIT => return Ok(None),
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => continue,
        };
        let feedback = session.self_grade(services.progress_mut(), knew).await?;
        return Ok(Some(feedback));
    }
}

async fn answer_typed(
    services: &mut AppServices,
    prompt: &mut Prompt,
    session: &mut QuizSession,
) -> Result<Option<AnswerFeedback>, Box<dyn Error>> {
    loop {
        let Some(line) = prompt.ask("Your answer: ").await? else {
            return Ok(None);
        };
        match line.as_str() {
            QUIT => return Ok(None),
            HINT => show_hint(session),
            "" => {}
            text => {
                let feedback = session.answer_text(services.progress_mut(), text).await?;
                return Ok(Some(feedback));
            }
        }
    }
}

//
// ─── SPEED ROUND ───────────────────────────────────────────────────────────────
//

fn show_speed_question(round: &SpeedRound) {
    if let (Some(question), Some(options)) = (round.current(), round.options()) {
        println!("\n[{}s] {}", round.remaining_secs(), question.prompt());
        println!("{}", render::options(options));
    }
}

pub async fn run_speed(services: &mut AppServices, prompt: &mut Prompt) -> PlayResult {
    let mut round = match SpeedRound::new(services.progress(), services.timings()) {
        Ok(round) => round,
        Err(SessionError::NoMaterial) => {
            no_material("the speed round");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let secs = services.timings().speed_round_secs;
    if prompt
        .ask(&format!("Speed round: {secs} seconds. Press Enter to start. "))
        .await?
        .is_none()
    {
        return Ok(());
    }

    let mut tick_token = round.start();
    loop {
        play_speed_round(services, prompt, &mut round, tick_token).await?;

        let score = round.score();
        println!(
            "\nRound over: {} of {} correct ({}%).",
            score.correct(),
            score.answered(),
            score.accuracy()
        );
        if !prompt.confirm("Go again? [y/N] ").await? {
            break;
        }
        tick_token = round.restart(services.progress())?;
    }
    Ok(())
}

async fn play_speed_round(
    services: &mut AppServices,
    prompt: &mut Prompt,
    round: &mut SpeedRound,
    tick_token: TimerToken,
) -> PlayResult {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    ticker.tick().await;

    let advance = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(advance);
    let mut pending: Option<TimerToken> = None;

    show_speed_question(round);
    loop {
        tokio::select! {
            _ = ticker.tick() => match round.tick(tick_token) {
                TickOutcome::Expired => {
                    println!("\nTime!");
                    return Ok(());
                }
                TickOutcome::Running { remaining_secs } if remaining_secs % 10 == 0 => {
                    println!("  ({remaining_secs}s left)");
                }
                TickOutcome::Running { .. } => {}
                TickOutcome::Stale => return Ok(()),
            },
            () = &mut advance, if pending.is_some() => {
                if let Some(token) = pending.take() {
                    round.auto_advance(token);
                }
                if round.is_finished() {
                    println!("\nOut of questions!");
                    return Ok(());
                }
                show_speed_question(round);
            }
            line = prompt.next_line() => {
                let Some(line) = line? else {
                    round.stop();
                    return Ok(());
                };
                if line == QUIT {
                    round.stop();
                    return Ok(());
                }
                if pending.is_some() {
                    continue;
                }
                let len = round.options().map_or(0, |options| options.len());
                let Some(index) = parse_choice(&line, len) else {
                    println!("  Pick a number from 1 to {len}.");
                    continue;
                };
                let answer = round.answer(services.progress_mut(), index).await?;
                println!("{}", render::feedback(&answer.feedback));
                pending = Some(answer.advance_token);
                advance.as_mut().reset(Instant::now() + answer.delay);
            }
        }
    }
}

//
// ─── ARCADE ────────────────────────────────────────────────────────────────────
//

pub async fn run_arcade(services: &mut AppServices, prompt: &mut Prompt) -> PlayResult {
    let mut run = match ArcadeRun::start(services.progress(), services.timings()) {
        Ok(run) => run,
        Err(SessionError::NoMaterial) => {
            no_material("arcade");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    println!("Arcade: one mistake ends the run. {QUIT} to stop.");

    loop {
        let (Some(question), Some(options)) = (run.current(), run.options()) else {
            break;
        };
        println!(
            "\n[score {} | speed x{:.2}] {}",
            run.score(),
            run.speed(),
            question.prompt()
        );
        println!("{}", render::options(options));
        let len = options.len();

        let Some(line) = prompt.ask("> ").await? else {
            break;
        };
        if line == QUIT {
            break;
        }
        let Some(index) = parse_choice(&line, len) else {
            println!("  Pick a number from 1 to {len}.");
            continue;
        };

        match run.answer(services.progress_mut(), index).await? {
            ArcadeOutcome::Continue { score, .. } => println!("Correct! Score {score}."),
            ArcadeOutcome::GameOver {
                score,
                correct_answer,
            } => {
                println!("Game over! The answer was: {correct_answer}. Final score {score}.");
                if !prompt.confirm("Play again? [y/N] ").await? {
                    break;
                }
                run.restart(services.progress())?;
            }
        }
    }
    Ok(())
}

//
// ─── RESET ─────────────────────────────────────────────────────────────────────
//

pub async fn run_reset(services: &mut AppServices, prompt: &mut Prompt) -> PlayResult {
    if !prompt
        .confirm("This forgets every answer and streak. Continue? [y/N] ")
        .await?
    {
        println!("Nothing changed.");
        return Ok(());
    }
    services.progress_mut().reset().await?;
    println!("Progress cleared.");
    Ok(())
}
