use clap::Parser;
use linebasic::graphics::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use linebasic::{BasicError, Canvas, Console, DrawingSurface, Executor, StdConsole};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::Ordering;

#[derive(Parser)]
#[command(name = "linebasic")]
#[command(about = "Line-numbered BASIC interpreter with simple graphics", version)]
struct Args {
    /// Program to load and run. Starts the interactive prompt when omitted.
    file: Option<PathBuf>,

    /// Graphics surface width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,

    /// Graphics surface height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,

    /// Seed for RND
    #[arg(long)]
    seed: Option<u64>,

    /// Draw graphics in a desktop window
    #[cfg(feature = "window")]
    #[arg(long)]
    window: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    #[cfg(feature = "window")]
    if args.window {
        let surface = linebasic::graphics::window::WindowSurface::new(args.width, args.height);
        return start(Executor::with_io(StdConsole::new(), surface), &args);
    }

    let canvas = Canvas::with_dimensions(args.width, args.height);
    start(Executor::with_io(StdConsole::new(), canvas), &args)
}

fn start<G: DrawingSurface>(executor: Executor<StdConsole, G>, args: &Args) -> ExitCode {
    let mut executor = match args.seed {
        Some(seed) => executor.with_seed(seed),
        None => executor,
    };

    let interrupt = executor.interrupt_handle();
    if let Err(e) = ctrlc::set_handler(move || interrupt.store(true, Ordering::SeqCst)) {
        warn!("Ctrl-C handler not installed: {}", e);
    }

    match &args.file {
        Some(path) => match run_file(&mut executor, path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                // Runtime errors were already shown by the executor
                if !matches!(e, BasicError::Runtime(_)) {
                    eprintln!("{}", e);
                }
                ExitCode::FAILURE
            }
        },
        None => {
            repl(&mut executor);
            ExitCode::SUCCESS
        }
    }
}

fn run_file<G: DrawingSurface>(
    executor: &mut Executor<StdConsole, G>,
    path: &Path,
) -> Result<(), BasicError> {
    let source = fs::read_to_string(path)?;
    executor.load(&source)?;
    executor.run()?;
    Ok(())
}

/// Interactive prompt: editor commands plus immediate statements
fn repl<G: DrawingSurface>(executor: &mut Executor<StdConsole, G>) {
    println!("linebasic {}", env!("CARGO_PKG_VERSION"));
    println!("Type HELP for help, QUIT to leave\n");

    let interrupt = executor.interrupt_handle();
    loop {
        let input = match executor.console_mut().read_line("> ") {
            Ok(input) => input,
            Err(e) => {
                debug!("prompt closed: {}", e);
                break;
            }
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, argument) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command.to_uppercase(), rest.trim()),
            None => (input.to_uppercase(), ""),
        };

        // A Ctrl-C typed at the prompt must not stop the next program
        interrupt.store(false, Ordering::SeqCst);

        match (command.as_str(), argument) {
            ("QUIT" | "EXIT" | "BYE", "") => break,
            ("HELP", "") => print_help(),
            ("NEW", "") => executor.clear_program(),
            ("LIST", "") => print!("{}", executor.listing()),
            // Errors are reported by the executor itself
            ("RUN", "") => {
                let _ = executor.run();
            }
            ("LOAD", file) if !file.is_empty() => {
                match fs::read_to_string(file).map_err(BasicError::from) {
                    Ok(source) => {
                        if let Err(e) = executor.load(&source) {
                            println!("{}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            ("SAVE", file) if !file.is_empty() => {
                if let Err(e) = fs::write(file, executor.listing()) {
                    println!("{}", BasicError::from(e));
                }
            }
            _ => match executor.execute_immediate(input) {
                Ok(()) | Err(BasicError::Runtime(_)) => {}
                Err(e) => println!("{}", e),
            },
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  RUN                      - Run the program");
    println!("  LIST                     - List the program");
    println!("  NEW                      - Clear the program and variables");
    println!("  LOAD file                - Merge a program file");
    println!("  SAVE file                - Write the listing to a file");
    println!("  QUIT                     - Leave the interpreter");
    println!();
    println!("Editing:");
    println!("  10 PRINT \"HELLO\"         - Store a program line");
    println!("  10                       - Delete line 10");
    println!("  PRINT 2 + 2              - Execute immediately");
    println!();
    println!("Statements:");
    println!("  PRINT, LET, INPUT, IF/THEN/ELSE, FOR/TO/STEP/NEXT, WHILE/WEND,");
    println!("  GOTO, GOSUB, RETURN, END, CLS, REM");
    println!("  GRAPHICS, PLOT, PSET, LINE x1, y1 TO x2, y2, CIRCLE, RECT, COLOR");
    println!();
    println!("Functions:");
    println!("  ABS INT SQR SIN COS TAN RND LEN CHR ASC TIMER");
}
