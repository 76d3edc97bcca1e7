//! # Tests Module
//!
//! Pipeline tests for the lexer, parser and machine, plus end-to-end
//! programs whose output is captured in memory.

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::{ErrorKind, KyouError, KyouResult, Span};
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::token::TokenKind;
    use crate::vm::{resolve_labels, Machine, MachineConfig};

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Tokenizes source and returns the token kinds (excluding Eof).
    fn tokenize(source: &str) -> Result<Vec<TokenKind>, KyouError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(tokens
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Eof))
            .collect())
    }

    fn parse(source: &str) -> KyouResult<Program> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse()
    }

    fn parse_one(source: &str) -> Instruction {
        let program = parse(source).unwrap();
        assert_eq!(program.len(), 1, "expected one instruction in {:?}", source);
        program.instructions.into_iter().next().unwrap()
    }

    /// Runs source on a fresh machine and returns the machine together with
    /// the run result, so tests can inspect both output and state.
    fn run_machine(source: &str, config: MachineConfig) -> (Machine<Vec<u8>>, KyouResult<()>) {
        let mut machine = Machine::new(config, Vec::new());
        let result = parse(source).and_then(|program| machine.run(&program));
        (machine, result)
    }

    fn output_of(machine: &Machine<Vec<u8>>) -> String {
        String::from_utf8(machine.output().clone()).unwrap()
    }

    /// Runs source and returns everything written to the output stream.
    fn run(source: &str) -> Result<String, String> {
        let (machine, result) = run_machine(source, MachineConfig::default());
        result.map_err(|e| e.to_string())?;
        Ok(output_of(&machine))
    }

    /// Runs source and expects a specific error kind.
    fn expect_error(source: &str, kind: ErrorKind) -> KyouError {
        let (_, result) = run_machine(source, MachineConfig::default());
        match result {
            Ok(()) => panic!("Expected {:?} error but program succeeded", kind),
            Err(e) => {
                assert_eq!(e.kind, kind, "Expected {:?} error, got: {}", kind, e);
                e
            }
        }
    }

    fn imm(n: i64) -> Source {
        Source::new(SourceKind::Immediate(n), Power::Spring)
    }

    fn number(source: &str) -> i64 {
        match tokenize(source).unwrap().as_slice() {
            [TokenKind::Number(n)] => *n,
            other => panic!("expected a single number, got {:?}", other),
        }
    }

    // =========================================================================
    // LEXER TESTS
    // =========================================================================

    #[test]
    fn lexer_single_digits() {
        assert_eq!(number("霊"), 0);
        assert_eq!(number("五"), 5);
        assert_eq!(number("九"), 9);
    }

    #[test]
    fn lexer_positional_numerals() {
        assert_eq!(number("三百四十五"), 345);
        assert_eq!(number("一千"), 1000);
        assert_eq!(number("十二"), 12);
        assert_eq!(number("十"), 10);
        assert_eq!(number("百十"), 110);
        assert_eq!(number("二千三"), 2003);
        assert_eq!(number("九万九千九百九十九"), 99_999);
    }

    #[test]
    fn lexer_rejects_repeated_level() {
        for source in ["一二", "十十", "百百", "五霊"] {
            let err = tokenize(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lexer, "{}", source);
            assert!(err.message.contains("malformed number"));
        }
    }

    #[test]
    fn lexer_rejects_non_decreasing_multipliers() {
        for source in ["十百", "百三百", "二十万"] {
            let err = tokenize(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lexer, "{}", source);
        }
    }

    #[test]
    fn lexer_compound_glyph_before_prefix() {
        let kinds = tokenize("品台品").unwrap();
        assert_eq!(kinds, vec![TokenKind::StorageBase, TokenKind::Storage]);
    }

    #[test]
    fn lexer_registers_and_powers() {
        let kinds = tokenize("火水木金土 春夏秋冬文字").unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fire,
                TokenKind::Water,
                TokenKind::Tree,
                TokenKind::Metal,
                TokenKind::Earth,
                TokenKind::Spring,
                TokenKind::Summer,
                TokenKind::Autumn,
                TokenKind::Winter,
                TokenKind::StringType,
                TokenKind::Char,
            ]
        );
    }

    #[test]
    fn lexer_instruction_glyphs() {
        let kinds = tokenize("動押弾呼帰 足引掛割余或共排 札別常等大小 日月星").unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Move,
                TokenKind::Push,
                TokenKind::Pop,
                TokenKind::Call,
                TokenKind::Return,
                TokenKind::Add,
                TokenKind::Sub,
                TokenKind::Mul,
                TokenKind::Div,
                TokenKind::Mod,
                TokenKind::Or,
                TokenKind::And,
                TokenKind::Xor,
                TokenKind::Label,
                TokenKind::Branch,
                TokenKind::Always,
                TokenKind::Equals,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Sun,
                TokenKind::Moon,
                TokenKind::Stars,
            ]
        );
    }

    #[test]
    fn lexer_identifiers() {
        let kinds = tokenize("札 loop2 札end").unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Label,
                TokenKind::Ident("loop2".to_string()),
                TokenKind::Label,
                TokenKind::Ident("end".to_string()),
            ]
        );
    }

    #[test]
    fn lexer_string_literal_is_verbatim() {
        let kinds = tokenize("「こんにちは # \\n」").unwrap();
        assert_eq!(kinds, vec![TokenKind::Str("こんにちは # \\n".to_string())]);
    }

    #[test]
    fn lexer_unterminated_string() {
        let err = tokenize("五動日\n「abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexer);
        assert_eq!(err.span, Some(Span::new(2, 1, 1)));
    }

    #[test]
    fn lexer_skips_bom_and_comments() {
        let kinds = tokenize("\u{feff}# header 火\n五動日 # trailing\n").unwrap();
        assert_eq!(
            kinds,
            vec![TokenKind::Number(5), TokenKind::Move, TokenKind::Sun]
        );
    }

    #[test]
    fn lexer_tracks_line_and_column() {
        let tokens = Lexer::new("火\n  水足").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3, 1));
        assert_eq!(tokens[2].span, Span::new(2, 4, 1));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn lexer_unknown_glyph_reports_position() {
        let err = tokenize("五 動 @").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexer);
        assert_eq!(err.span, Some(Span::new(1, 5, 1)));
    }

    #[test]
    fn lexer_empty_source() {
        let tokens = Lexer::new("").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    // =========================================================================
    // PARSER TESTS
    // =========================================================================

    #[test]
    fn parser_arith_op() {
        assert_eq!(
            parse_one("火 足 十"),
            Instruction::Arith {
                reg: Register::Fire,
                power: Power::Spring,
                op: ArithOp::Add,
                src: imm(10),
            }
        );
    }

    #[test]
    fn parser_arith_op_with_powers() {
        assert_eq!(
            parse_one("火冬 引 水夏"),
            Instruction::Arith {
                reg: Register::Fire,
                power: Power::Winter,
                op: ArithOp::Sub,
                src: Source::new(SourceKind::Register(Register::Water), Power::Summer),
            }
        );
    }

    #[test]
    fn parser_bitwise_ops_are_accepted() {
        for (source, op) in [("火 或 一", ArithOp::Or), ("火 共 一", ArithOp::And), ("火 排 一", ArithOp::Xor)] {
            match parse_one(source) {
                Instruction::Arith { op: parsed, .. } => assert_eq!(parsed, op),
                other => panic!("expected arith, got {:?}", other),
            }
        }
    }

    #[test]
    fn parser_register_falls_back_to_move() {
        assert_eq!(
            parse_one("火 動 水"),
            Instruction::Move {
                src: Source::new(SourceKind::Register(Register::Fire), Power::Spring),
                dest: Destination::new(DestinationKind::Register(Register::Water), Power::Spring),
            }
        );
    }

    #[test]
    fn parser_move_memory_operands() {
        assert_eq!(
            parse_one("星 品台 秋 動 星 札 buf 冬"),
            Instruction::Move {
                src: Source::new(
                    SourceKind::Memory(Address::Register(Register::StorageBase)),
                    Power::Autumn
                ),
                dest: Destination::new(
                    DestinationKind::Memory(Address::Label("buf".to_string())),
                    Power::Winter
                ),
            }
        );
    }

    #[test]
    fn parser_label_reference_as_source() {
        assert_eq!(
            parse_one("札 here 動 日"),
            Instruction::Move {
                src: Source::new(SourceKind::Label("here".to_string()), Power::Spring),
                dest: Destination::new(DestinationKind::Output, Power::Spring),
            }
        );
    }

    #[test]
    fn parser_label_declaration() {
        assert_eq!(
            parse_one("札 loop"),
            Instruction::Label {
                name: "loop".to_string()
            }
        );
    }

    #[test]
    fn parser_unconditional_branch() {
        assert_eq!(
            parse_one("別 札 end 常"),
            Instruction::Branch {
                target: Address::Label("end".to_string()),
                kind: BranchKind::Always,
                operands: None,
            }
        );
    }

    #[test]
    fn parser_conditional_branches() {
        let cases = [
            ("別 三 火 等 五", BranchKind::Equals),
            ("別 三 火 大 五", BranchKind::Greater),
            ("別 三 火 小 五", BranchKind::Less),
            ("別 三 火 大等 五", BranchKind::GreaterOrEqual),
            ("別 三 火 小等 五", BranchKind::LessOrEqual),
        ];
        for (source, expected) in cases {
            assert_eq!(
                parse_one(source),
                Instruction::Branch {
                    target: Address::Immediate(3),
                    kind: expected,
                    operands: Some((
                        Source::new(SourceKind::Register(Register::Fire), Power::Spring),
                        imm(5)
                    )),
                },
                "{}",
                source
            );
        }
    }

    #[test]
    fn parser_stack_and_call_statements() {
        let program = parse("押 五\n弾 火冬\n呼 札 f\n帰\n「hi」動日").unwrap();
        assert_eq!(
            program.instructions,
            vec![
                Instruction::Push { src: imm(5) },
                Instruction::Pop {
                    dest: Destination::new(DestinationKind::Register(Register::Fire), Power::Winter)
                },
                Instruction::Call {
                    target: Address::Label("f".to_string())
                },
                Instruction::Return,
                Instruction::PrintLiteral {
                    text: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn parser_records_statement_spans() {
        let program = parse("五動日\n  帰").unwrap();
        assert_eq!(program.spans, vec![Span::new(1, 1, 1), Span::new(2, 3, 1)]);
    }

    #[test]
    fn parser_output_cannot_carry_power() {
        let err = parse("五動日冬").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
        assert_eq!(err.span, Some(Span::new(1, 4, 1)));
    }

    #[test]
    fn parser_missing_source_after_operator() {
        let err = parse("火 足").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn parser_label_needs_identifier() {
        let err = parse("札 五").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
        assert_eq!(err.span, Some(Span::new(1, 3, 1)));
    }

    #[test]
    fn parser_branch_needs_relation() {
        let err = parse("別 札 x 火 五").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
        assert!(err.message.contains("relation"));
    }

    #[test]
    fn parser_string_only_moves_to_output() {
        let err = parse("「a」 動 火").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
    }

    #[test]
    fn parser_no_rule_matches() {
        let err = parse("五動日\n動 日").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parser);
        assert_eq!(err.span, Some(Span::new(2, 1, 1)));
        assert!(err.message.contains("syntax error"));
    }

    #[test]
    fn parser_empty_program() {
        assert!(parse("# nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn parser_adds_missing_eof() {
        let tokens = vec![crate::token::Token::new(TokenKind::Return, Span::new(1, 1, 1))];
        let program = Parser::new(tokens).parse().unwrap();
        assert_eq!(program.instructions, vec![Instruction::Return]);
    }

    // =========================================================================
    // LABEL PRE-PASS
    // =========================================================================

    #[test]
    fn labels_resolve_to_following_index() {
        let program = parse("五動日\n札 a\n帰\n札 b").unwrap();
        let labels = resolve_labels(&program).unwrap();
        assert_eq!(labels.get("a"), Some(&2));
        assert_eq!(labels.get("b"), Some(&4));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn duplicate_label_fails_before_execution() {
        let (machine, result) = run_machine("札 a\n五動日\n札 a", MachineConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateLabel);
        assert_eq!(err.span, Some(Span::new(3, 1, 1)));
        assert_eq!(output_of(&machine), "");
        assert_eq!(machine.steps(), 0);
    }

    // =========================================================================
    // MACHINE TESTS
    // =========================================================================

    #[test]
    fn vm_immediate_to_output() {
        assert_eq!(run("五動日").unwrap(), "5\n");
    }

    #[test]
    fn vm_print_literal() {
        assert_eq!(run("「こんにちは」 動 日").unwrap(), "こんにちは\n");
    }

    #[test]
    fn vm_add_accumulates() {
        assert_eq!(run("火 足 十\n火 足 十\n火 動 日").unwrap(), "20\n");
    }

    #[test]
    fn vm_arithmetic_operators() {
        let source = "火 足 百\n火 引 三\n火 動 日\n火 割 七\n火 動 日\n火 余 五\n火 動 日\n火 掛 六\n火 動 日";
        assert_eq!(run(source).unwrap(), "97\n13\n3\n18\n");
    }

    #[test]
    fn vm_division_by_zero() {
        let err = expect_error("火 割 霊", ErrorKind::Arithmetic);
        assert!(err.message.contains("division"));
        expect_error("火 余 水", ErrorKind::Arithmetic);
    }

    #[test]
    fn vm_bitwise_operators_fail_at_execution() {
        expect_error("火 或 一", ErrorKind::UnsupportedOperand);
        expect_error("火 共 一", ErrorKind::UnsupportedOperand);
        expect_error("火 排 一", ErrorKind::UnsupportedOperand);
    }

    #[test]
    fn vm_register_moves() {
        assert_eq!(run("七 動 水\n水 動 木\n木 動 日").unwrap(), "7\n");
    }

    #[test]
    fn vm_unconditional_branch_skips() {
        let source = "別 札 end 常\n五動日\n札 end\n七動日";
        assert_eq!(run(source).unwrap(), "7\n");
    }

    #[test]
    fn vm_counting_loop() {
        let source = "札 loop\n火 足 一\n火 動 日\n別 札 loop 火 小 三";
        assert_eq!(run(source).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn vm_countdown_with_greater_or_equal() {
        let source = "火 足 三\n札 top\n火 動 日\n火 引 一\n別 札 top 火 大等 一";
        assert_eq!(run(source).unwrap(), "3\n2\n1\n");
    }

    #[test]
    fn vm_equals_branch() {
        let source = "別 札 skip 火 等 霊\n五動日\n札 skip\n七動日";
        assert_eq!(run(source).unwrap(), "7\n");
    }

    #[test]
    fn vm_branch_not_taken_falls_through() {
        let source = "別 札 skip 火 大 霊\n五動日\n札 skip";
        assert_eq!(run(source).unwrap(), "5\n");
    }

    #[test]
    fn vm_branch_to_register_address() {
        let source = "火 足 三\n別 火 常\n五動日\n七動日";
        assert_eq!(run(source).unwrap(), "7\n");
    }

    #[test]
    fn vm_label_source_is_its_address() {
        assert_eq!(run("五動日\n札 here\n札 here 動 日").unwrap(), "5\n2\n");
    }

    #[test]
    fn vm_unresolved_label() {
        let err = expect_error("五動日\n別 札 nowhere 常", ErrorKind::UnresolvedLabel);
        assert_eq!(err.span, Some(Span::new(2, 1, 1)));
    }

    #[test]
    fn vm_negative_jump() {
        expect_error("火 引 五\n別 火 常", ErrorKind::InvalidAddress);
    }

    #[test]
    fn vm_push_pop_is_lifo() {
        let (machine, result) = run_machine(
            "押 一\n押 二\n押 三\n弾 日\n弾 日\n弾 日",
            MachineConfig::default(),
        );
        result.unwrap();
        assert_eq!(output_of(&machine), "3\n2\n1\n");
        assert_eq!(
            machine.register(Register::Storage),
            MachineConfig::default().stack_base as i64
        );
    }

    #[test]
    fn vm_push_advances_stack_pointer() {
        let (machine, result) = run_machine("押 一\n押 二", MachineConfig::default());
        result.unwrap();
        let base = MachineConfig::default().stack_base as i64;
        assert_eq!(machine.register(Register::Storage), base + 16);
        assert_eq!(machine.register(Register::StorageBase), base);
        assert_eq!(machine.peek_memory(base + 8, Power::Winter).unwrap(), 2);
    }

    #[test]
    fn vm_pop_empty_stack() {
        expect_error("弾 火", ErrorKind::StackUnderflow);
        expect_error("帰", ErrorKind::StackUnderflow);
    }

    /// Leaves `i64::MIN` in 火 by doubling one 63 times with wrapping `掛`.
    const FIRE_TO_MIN: &str = "火 足 一\n札 l\n火 掛 二\n水 足 一\n別 札 l 水 小 六十三\n";

    #[test]
    fn vm_pop_with_wrapped_stack_pointer() {
        let source = format!("{}火 動 品\n弾 木", FIRE_TO_MIN);
        let (machine, result) = run_machine(&source, MachineConfig::default());
        assert_eq!(result.unwrap_err().kind, ErrorKind::StackUnderflow);
        assert_eq!(machine.register(Register::Storage), i64::MIN);
    }

    #[test]
    fn vm_return_to_largest_address() {
        let source = format!("{}火 引 一\n押 火\n帰", FIRE_TO_MIN);
        let err = expect_error(&source, ErrorKind::InvalidAddress);
        assert_eq!(err.span, Some(Span::new(8, 1, 1)));
    }

    #[test]
    fn vm_base_pointer_bounds_pops() {
        let (machine, result) = run_machine(
            "押 一\n品 動 品台\n押 二\n弾 火\n弾 水",
            MachineConfig::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackUnderflow);
        assert_eq!(err.span, Some(Span::new(5, 1, 1)));
        assert_eq!(machine.register(Register::Fire), 2);
        assert_eq!(machine.register(Register::Water), 0);
    }

    #[test]
    fn vm_nested_calls_return_in_reverse_order() {
        let source = "\
呼 札 first
「done」 動 日
別 札 end 常
札 first
「first」 動 日
呼 札 second
「back」 動 日
帰
札 second
「second」 動 日
帰
札 end";
        let (machine, result) = run_machine(source, MachineConfig::default());
        result.unwrap();
        assert_eq!(output_of(&machine), "first\nsecond\nback\ndone\n");
        assert_eq!(
            machine.register(Register::Storage),
            MachineConfig::default().stack_base as i64
        );
    }

    #[test]
    fn vm_power_widening_is_allowed() {
        assert_eq!(run("火 動 水冬\n五夏 動 木秋\n木秋 動 日").unwrap(), "5\n");
    }

    #[test]
    fn vm_power_narrowing_is_rejected() {
        expect_error("火冬 動 水", ErrorKind::PowerMismatch);
        expect_error("五秋 動 水夏", ErrorKind::PowerMismatch);
        expect_error("火 足 水冬", ErrorKind::PowerMismatch);
    }

    #[test]
    fn vm_string_power_into_ordered_destination_is_rejected() {
        expect_error("五文 動 火", ErrorKind::PowerMismatch);
        expect_error("五文 動 火冬", ErrorKind::PowerMismatch);
        assert_eq!(run("五文 動 火文").unwrap(), "");
    }

    #[test]
    fn vm_pop_checks_pushed_power() {
        expect_error("押 火冬\n弾 水", ErrorKind::PowerMismatch);
        assert_eq!(run("押 五冬\n弾 水冬\n水冬 動 日").unwrap(), "5\n");
    }

    #[test]
    fn vm_char_output() {
        assert_eq!(run("六十五字 動 日").unwrap(), "A\n");
    }

    #[test]
    fn vm_string_output_reads_memory() {
        let source = "七十二 動 星 百\n百五 動 星 百一\n百文 動 日\n星 百 文 動 日";
        assert_eq!(run(source).unwrap(), "Hi\nHi\n");
    }

    #[test]
    fn vm_memory_width_follows_power() {
        assert_eq!(run("三百 動 星 霊 夏\n星 霊 夏 動 火夏\n火夏 動 日").unwrap(), "300\n");
        assert_eq!(run("三百 動 星 霊\n星 霊 動 日").unwrap(), "44\n");
        assert_eq!(run("二百 動 星 霊\n星 霊 動 日").unwrap(), "-56\n");
    }

    #[test]
    fn vm_memory_out_of_bounds() {
        let config = MachineConfig {
            memory_size: 16,
            ..MachineConfig::default()
        };
        let (_, result) = run_machine("五 動 星 二十", config);
        assert_eq!(result.unwrap_err().kind, ErrorKind::MemoryAccess);
    }

    #[test]
    fn vm_step_limit() {
        let config = MachineConfig {
            max_steps: Some(100),
            ..MachineConfig::default()
        };
        let (machine, result) = run_machine("札 a\n別 札 a 常", config);
        assert_eq!(result.unwrap_err().kind, ErrorKind::StepLimit);
        assert_eq!(machine.steps(), 100);
    }

    #[test]
    fn vm_output_before_failure_is_kept() {
        let (machine, result) = run_machine("五動日\n火 割 霊", MachineConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.span, Some(Span::new(2, 1, 1)));
        assert_eq!(output_of(&machine), "5\n");
    }

    #[test]
    fn vm_state_persists_across_runs() {
        let program = parse("火 足 五").unwrap();
        let mut machine = Machine::new(MachineConfig::default(), Vec::new());
        machine.run(&program).unwrap();
        machine.run(&program).unwrap();
        assert_eq!(machine.register(Register::Fire), 10);

        machine.reset();
        assert_eq!(machine.register(Register::Fire), 0);
        assert_eq!(machine.steps(), 0);
    }

    #[test]
    fn vm_load_bytes_then_print() {
        let program = parse("二十文 動 日").unwrap();
        let mut machine = Machine::new(MachineConfig::default(), Vec::new());
        machine.load_bytes(20, b"kyou\0junk").unwrap();
        machine.run(&program).unwrap();
        assert_eq!(output_of(&machine), "kyou\n");
    }

    // =========================================================================
    // END-TO-END
    // =========================================================================

    #[test]
    fn e2e_run_source_returns_writer() {
        let out = crate::run_source("四十二 動 日", MachineConfig::default(), Vec::new()).unwrap();
        assert_eq!(out, b"42\n");
    }

    #[test]
    fn e2e_compile_reports_lex_errors() {
        let err = crate::compile("五動日\n@").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexer);
        assert_eq!(err.span, Some(Span::new(2, 1, 1)));
    }

    #[test]
    fn e2e_factorial_subroutine() {
        let source = "\
# factorial of five through a subroutine
五 動 水
一 動 火
呼 札 fact
火 動 日
別 札 done 常

札 fact
別 札 ret 水 小 二
火 掛 水
水 引 一
呼 札 fact
札 ret
帰

札 done";
        assert_eq!(run(source).unwrap(), "120\n");
    }

    #[test]
    fn e2e_listing_shows_glyphs() {
        let program = parse("火冬 足 星 水 秋").unwrap();
        assert_eq!(program.instructions[0].to_string(), "ADD    火冬 星水秋");
    }
}
