//! Interpreter tests over hand-assembled bytecode

#[cfg(test)]
mod interpreter_tests {
    use crate::evm::opcode as op;
    use crate::evm::*;
    use crate::utils::vm_config::VmSettings;
    use crate::word::Word;
    use num_bigint::BigInt;

    fn run(code: &[u8], calldata: &[u8]) -> Result<Execution, VmFault> {
        Interpreter::default().execute(code, calldata)
    }

    /// Store the top of the stack at 0 and return it
    fn return_top(asm: Assembler) -> Vec<u8> {
        asm.op(op::PUSH0)
            .op(op::MSTORE)
            .push_u64(32)
            .op(op::PUSH0)
            .op(op::RETURN)
            .build()
            .unwrap()
    }

    fn returned_word(asm: Assembler) -> Word {
        let execution = run(&return_top(asm), &[]).unwrap();
        match execution.outcome {
            ExecutionOutcome::Return(data) => Word::from_slice(&data).unwrap(),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    fn signed(value: i64) -> Word {
        Word::from_signed(&BigInt::from(value)).unwrap()
    }

    #[test]
    fn test_add_and_sub() {
        let sum = returned_word(Assembler::new().push_u64(3).push_u64(4).op(op::ADD));
        assert_eq!(sum, Word::from_u64(7));

        // SUB computes top - second
        let diff = returned_word(Assembler::new().push_u64(3).push_u64(10).op(op::SUB));
        assert_eq!(diff, Word::from_u64(7));
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let wrapped = returned_word(Assembler::new().push_u64(1).push_word(Word::new([0xff; 32])).op(op::ADD));
        assert!(wrapped.is_zero());

        let underflow = returned_word(Assembler::new().push_u64(1).push_u64(0).op(op::SUB));
        assert_eq!(underflow, Word::new([0xff; 32]));
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let quotient = returned_word(Assembler::new().push_u64(0).push_u64(9).op(op::DIV));
        assert!(quotient.is_zero());
        let remainder = returned_word(Assembler::new().push_u64(0).push_u64(9).op(op::SMOD));
        assert!(remainder.is_zero());
    }

    #[test]
    fn test_signed_ops() {
        let quotient = returned_word(Assembler::new().push_u64(2).push_word(signed(-8)).op(op::SDIV));
        assert_eq!(quotient.to_signed(), BigInt::from(-4));

        let remainder = returned_word(Assembler::new().push_u64(3).push_word(signed(-7)).op(op::SMOD));
        assert_eq!(remainder.to_signed(), BigInt::from(-1));

        let less = returned_word(Assembler::new().push_u64(1).push_word(signed(-1)).op(op::SLT));
        assert_eq!(less, Word::from_u64(1));

        let greater = returned_word(Assembler::new().push_u64(1).push_word(signed(-1)).op(op::SGT));
        assert!(greater.is_zero());

        let shifted = returned_word(Assembler::new().push_word(signed(-16)).push_u64(2).op(op::SAR));
        assert_eq!(shifted.to_signed(), BigInt::from(-4));

        let extended = returned_word(Assembler::new().push_u64(0xff).push_u64(0).op(op::SIGNEXTEND));
        assert_eq!(extended.to_signed(), BigInt::from(-1));

        let positive = returned_word(Assembler::new().push_u64(0x017f).push_u64(0).op(op::SIGNEXTEND));
        assert_eq!(positive, Word::from_u64(0x7f));
    }

    #[test]
    fn test_bit_ops() {
        let byte = returned_word(Assembler::new().push_u64(0x1234).push_u64(31).op(op::BYTE));
        assert_eq!(byte, Word::from_u64(0x34));

        let out_of_range = returned_word(Assembler::new().push_u64(0x1234).push_u64(32).op(op::BYTE));
        assert!(out_of_range.is_zero());

        let shl = returned_word(Assembler::new().push_u64(1).push_u64(4).op(op::SHL));
        assert_eq!(shl, Word::from_u64(16));

        let too_far = returned_word(Assembler::new().push_u64(1).push_u64(256).op(op::SHL));
        assert!(too_far.is_zero());

        let sar_all = returned_word(Assembler::new().push_word(signed(-5)).push_u64(300).op(op::SAR));
        assert_eq!(sar_all, Word::new([0xff; 32]));
    }

    #[test]
    fn test_exp_and_modular() {
        let cube = returned_word(Assembler::new().push_u64(3).push_u64(3).op(op::EXP));
        assert_eq!(cube, Word::from_u64(27));

        let wrapped = returned_word(Assembler::new().push_u64(256).push_u64(2).op(op::EXP));
        assert!(wrapped.is_zero());

        // (2^256 - 1 + 2) mod 10, computed without wrapping
        let addmod = returned_word(
            Assembler::new()
                .push_u64(10)
                .push_u64(2)
                .push_word(Word::new([0xff; 32]))
                .op(op::ADDMOD),
        );
        assert_eq!(addmod, Word::from_u64(7));
    }

    #[test]
    fn test_keccak() {
        // keccak256 of the empty string
        let hash = returned_word(Assembler::new().push_u64(0).push_u64(0).op(op::KECCAK256));
        assert_eq!(
            hash.to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_jumps() {
        let code = return_top(
            Assembler::new()
                .push_u64(1)
                .jump_if("skip")
                .op(op::INVALID)
                .label("skip")
                .push_u64(5),
        );
        let execution = run(&code, &[]).unwrap();
        assert!(execution.outcome.is_success());

        // Offset 1 is inside PUSH1's immediate
        let code = vec![op::PUSH1, op::JUMPDEST, op::PUSH1, 0x01, op::JUMP];
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::InvalidJump(1)));
    }

    #[test]
    fn test_memory() {
        let code = Assembler::new()
            .push_u64(0xab)
            .push_u64(0x40)
            .op(op::MSTORE8)
            .op(op::MSIZE)
            .op(op::PUSH0)
            .op(op::MSTORE)
            .push_u64(32)
            .op(op::PUSH0)
            .op(op::RETURN)
            .build()
            .unwrap();
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Word::from_u64(0x60).as_bytes().to_vec()));

        // Zero-length return at an absurd offset does not touch memory
        let code = Assembler::new()
            .op(op::PUSH0)
            .push_word(Word::new([0xff; 32]))
            .op(op::RETURN)
            .build()
            .unwrap();
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Vec::new()));
    }

    #[test]
    fn test_storage_is_per_execution() {
        let code = return_top(
            Assembler::new()
                .op(op::PUSH0)
                .op(op::SLOAD)
                .push_u64(1)
                .op(op::ADD)
                .op(op::DUP1)
                .op(op::PUSH0)
                .op(op::SSTORE),
        );
        let interpreter = Interpreter::default();
        for _ in 0..2 {
            let execution = interpreter.execute(&code, &[]).unwrap();
            assert_eq!(execution.outcome, ExecutionOutcome::Return(Word::from_u64(1).as_bytes().to_vec()));
        }
    }

    #[test]
    fn test_calldata_zero_padded() {
        let code = return_top(Assembler::new().push_u64(2).op(op::CALLDATALOAD));
        let execution = run(&code, &[0x11, 0x22, 0x33]).unwrap();
        let mut expected = [0u8; 32];
        expected[0] = 0x33;
        assert_eq!(execution.outcome, ExecutionOutcome::Return(expected.to_vec()));
    }

    #[test]
    fn test_logs_captured() {
        let code = Assembler::new()
            .push_u64(0xbeef)
            .op(op::PUSH0)
            .op(op::MSTORE)
            .push_u64(0x77)
            .push_u64(32)
            .op(op::PUSH0)
            .op(0xa1)
            .op(op::STOP)
            .build()
            .unwrap();
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.logs.len(), 1);
        assert_eq!(execution.logs[0].topics, vec![Word::from_u64(0x77)]);
        assert_eq!(execution.logs[0].data, Word::from_u64(0xbeef).as_bytes().to_vec());
    }

    #[test]
    fn test_revert_keeps_data() {
        let code = Assembler::new()
            .push_u64(0x2a)
            .op(op::PUSH0)
            .op(op::MSTORE)
            .push_u64(32)
            .op(op::PUSH0)
            .op(op::REVERT)
            .build()
            .unwrap();
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Revert(Word::from_u64(0x2a).as_bytes().to_vec()));
    }

    #[test]
    fn test_halts() {
        let execution = run(&[op::ADD], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::StackUnderflow));

        let execution = run(&[op::INVALID], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::DesignatedInvalid));

        let execution = run(&[0x0c], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::InvalidOpcode(0x0c)));

        let execution = run(&[op::PUSH1, 0x01, op::PUSH0, op::PUSH0, op::RETURNDATACOPY], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::ReturnDataOutOfBounds));

        let code = Assembler::new().label("top").op(op::PUSH0).jump("top").build().unwrap();
        let execution = run(&code, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Halt(HaltReason::StackOverflow));
    }

    #[test]
    fn test_implicit_stop() {
        let execution = run(&[], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Vec::new()));
        assert_eq!(execution.steps, 0);

        // Truncated PUSH immediate is zero-padded and ends execution
        let execution = run(&[op::PUSH2, 0x01], &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Vec::new()));
        assert_eq!(execution.steps, 1);
    }

    #[test]
    fn test_step_limit_fault() {
        let code = Assembler::new().label("top").jump("top").build().unwrap();
        let interpreter = Interpreter::new(VmSettings::standard().with_step_limit(1_000));
        let fault = interpreter.execute(&code, &[]).unwrap_err();
        assert_eq!(fault, VmFault::StepLimitExceeded(1_000));
    }

    #[test]
    fn test_memory_limit_fault() {
        let code = Assembler::new()
            .push_u64(1)
            .push_u64(1 << 40)
            .op(op::MSTORE)
            .build()
            .unwrap();
        let fault = run(&code, &[]).unwrap_err();
        assert!(matches!(fault, VmFault::MemoryLimitExceeded { .. }));
    }

    #[test]
    fn test_unsupported_opcode_fault() {
        let fault = run(&[op::CALL], &[]).unwrap_err();
        assert_eq!(fault, VmFault::UnsupportedOpcode { opcode: op::CALL, name: "CALL" });
    }

    #[test]
    fn test_code_too_large() {
        let interpreter = Interpreter::new(VmSettings::strict());
        let code = vec![op::JUMPDEST; interpreter.settings().max_code_size + 1];
        let fault = interpreter.execute(&code, &[]).unwrap_err();
        assert!(matches!(fault, VmFault::CodeTooLarge { .. }));
    }

    #[test]
    fn test_block_environment() {
        let mut settings = VmSettings::standard();
        settings.block.chain_id = 137;
        settings.block.caller[19] = 0x42;

        let chain = return_top(Assembler::new().op(op::CHAINID));
        let execution = Interpreter::new(settings.clone()).execute(&chain, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Word::from_u64(137).as_bytes().to_vec()));

        let caller = return_top(Assembler::new().op(op::CALLER));
        let execution = Interpreter::new(settings).execute(&caller, &[]).unwrap();
        assert_eq!(execution.outcome, ExecutionOutcome::Return(Word::from_u64(0x42).as_bytes().to_vec()));
    }
}
