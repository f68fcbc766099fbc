use {
    clap::Parser,
    gridpath::{
        keypad::{CodeList, Key, KeypadChain},
        open_utf8_file, RunArgs,
    },
};

/// Computes the complexity sum of a list of codes entered through a chain of directional control
/// pads driving a numeric pad
#[derive(Parser)]
struct Args {
    #[command(flatten)]
    run: RunArgs,

    /// Number of directional control pads between the typist and the numeric pad
    #[arg(short, long, default_value_t = 2_usize)]
    depth: usize,
}

fn main() {
    let args: Args = Args::parse();

    // SAFETY: The input file is expected to not be modified while it is open.
    unsafe {
        open_utf8_file(args.run.input_file_path("codes.txt"), |input: &str| {
            match CodeList::try_from(input) {
                Ok(code_list) => {
                    let mut chain: KeypadChain = KeypadChain::standard();

                    if args.run.verbose {
                        for code in code_list.codes() {
                            let code_str: String = code
                                .keys()
                                .iter()
                                .map(|key: &Key| *key as u8 as char)
                                .collect();

                            match chain.min_presses(code.keys(), args.depth) {
                                Ok(presses) => println!(
                                    "{code_str}: {presses} presses, complexity {}",
                                    presses * code.numeric_part()
                                ),
                                Err(error) => eprintln!("{code_str}: {error:?}"),
                            }
                        }
                    }

                    match code_list.complexity_sum(&mut chain, args.depth) {
                        Ok(complexity_sum) => println!("complexity sum: {complexity_sum}"),
                        Err(error) => eprintln!("{error:?}"),
                    }
                }
                Err(error) => eprintln!("{error:#?}"),
            }
        })
    }
    .unwrap_or_else(|error| eprintln!("{error:#?}"));
}
