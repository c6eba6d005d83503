fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if handle_cli_flags(&args) {
        return;
    }

    if let Err(err) = reel_tui::run(parse_launch_options(&args)) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(args: &[String]) -> bool {
    let mut saw_flag = false;
    for arg in args {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Reel-TUI {}", reel_tui::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Reel-TUI — Swipe through the Noticias.lat video feed from the terminal.\n\n  --start <id>, -s <id>   Open the feed at the given story\n  --offline               Browse built-in sample stories without the network\n  --version,    -V        Show version and exit\n  --help,       -h        Show this help message"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}

fn parse_launch_options(args: &[String]) -> reel_tui::app::LaunchOptions {
    let mut opts = reel_tui::app::LaunchOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--start" | "-s" => opts.start_id = iter.next().cloned(),
            "--offline" => opts.offline = true,
            _ => {}
        }
    }
    opts
}
