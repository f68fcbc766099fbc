use {
    clap::Parser,
    gridpath::{
        maze::{Maze, Route, DEFAULT_TURN_PENALTY},
        open_utf8_file, RunArgs,
    },
};

/// Computes the minimum turn-penalized route cost through a maze, along with the number of cells
/// lying on any minimum-cost route
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    run: RunArgs,

    /// Cost of rotating in place by a quarter turn
    #[arg(short, long, default_value_t = DEFAULT_TURN_PENALTY)]
    turn_penalty: u32,
}

fn main() {
    let args: Args = Args::parse();

    // SAFETY: The input file is expected to not be modified while it is open.
    unsafe {
        open_utf8_file(args.run.input_file_path("maze.txt"), |input: &str| {
            match Maze::try_from(input) {
                Ok(maze) => {
                    let route: Route = maze.route(args.turn_penalty);

                    match route.min_cost() {
                        Some(min_cost) => {
                            println!("min cost: {min_cost}");
                            println!("best cells: {}", route.best_cell_count());

                            if args.run.verbose {
                                println!("{}", maze.annotated_grid_string(&route));
                            }
                        }
                        None => println!("unreachable"),
                    }
                }
                Err(error) => eprintln!("{error:#?}"),
            }
        })
    }
    .unwrap_or_else(|error| eprintln!("{error:#?}"));
}
