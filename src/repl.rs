use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use std::io::Write;

use kyou::error::format_error;
use kyou::vm::Machine;

/// Reads entries until EOF or `.exit`. Each entry is compiled and run on
/// the same machine, so registers and memory carry over between entries.
pub fn start<W: Write>(machine: &mut Machine<W>) {
    let mut editor = match DefaultEditor::new() {
        Ok(ed) => ed,
        Err(e) => {
            kyou::error!("failed to initialize prompt: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        let input = match read_input(&mut editor) {
            Some(line) => line,
            None => break,
        };

        if input.trim().is_empty() {
            continue;
        }

        match input.trim() {
            ".reset" => {
                machine.reset();
                continue;
            }
            ".regs" => {
                print_registers(machine);
                continue;
            }
            _ => {}
        }

        let result = kyou::compile(&input).and_then(|program| machine.run(&program));
        if let Err(e) = result {
            eprintln!("{}", format_error(&e, &input, "<repl>"));
        }
    }
}

fn read_input(editor: &mut DefaultEditor) -> Option<String> {
    let first_line = match editor.readline("今> ") {
        Ok(line) => line,
        Err(ReadlineError::Eof | ReadlineError::Interrupted) => return None,
        Err(e) => {
            kyou::error!("readline error: {}", e);
            return None;
        }
    };

    if first_line.trim() == ".exit" {
        return None;
    }

    let mut buffer = first_line;

    while needs_continuation(&buffer) {
        match editor.readline(".. ") {
            Ok(line) => {
                buffer.push('\n');
                buffer.push_str(&line);
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(e) => {
                kyou::error!("readline error: {}", e);
                break;
            }
        }
    }

    let _ = editor.add_history_entry(&buffer);
    Some(buffer)
}

/// An unclosed `「` keeps the entry open.
fn needs_continuation(input: &str) -> bool {
    let mut open = false;
    for c in input.chars() {
        match c {
            '「' => open = true,
            '」' => open = false,
            _ => {}
        }
    }
    open
}

fn print_registers<W: Write>(machine: &Machine<W>) {
    use kyou::ast::Register::*;
    for reg in [Fire, Water, Tree, Metal, Earth, Storage, StorageBase] {
        println!("{:<4} {}", reg.glyph(), machine.register(reg));
    }
}
