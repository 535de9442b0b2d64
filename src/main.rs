// f3core main program

mod config;
mod error;
mod internals;
mod kernel;
mod runtime;

use config::Config;
use internals::files::{FileHandle, FileMode};
use internals::parsing::InputFrame;
use runtime::ForthRuntime;

fn main() {
    let config = Config::from_args();
    let mut rt = ForthRuntime::new();
    rt.msg.set_level(config.debug_level);
    rt.tracing = config.trace;
    rt.show_stack = !config.quiet;
    rt.cold_start();

    if !config.quiet {
        println!("f3core {}", config::VERSION);
    }

    if let Some(path) = &config.infile {
        let resolved = rt.resolve_include_path(path);
        match FileHandle::new_file(&resolved, FileMode::RO) {
            Ok(handle) => {
                rt.reader.push(handle);
                rt.input.push(InputFrame::new(path.clone()));
                rt.quit();
            }
            Err(e) => {
                rt.msg.error("main", "unable to open infile", Some(e));
                std::process::exit(1);
            }
        }
    }

    if let Some(word) = &config.execute {
        if rt.execute_word(word).is_err() {
            std::process::exit(1);
        }
        return;
    }

    if atty_stdin() {
        rt.use_tui_console();
    }
    rt.quit();
}

fn atty_stdin() -> bool {
    use crossterm::tty::IsTty;
    std::io::stdin().is_tty()
}
