//! Benchmarks the per-instruction cost of building a symbolic effect: how
//! much a caller pays per `Session::build` call on the hot arithmetic and
//! memory paths, with and without hash-consing, one file per `[[bench]]`
//! entry driven by `criterion`.

use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};
use x86_symex_core::config::{
    CpuBitSize,
    SessionConfig,
};
use x86_symex_core::instruction::Instruction;
use x86_symex_core::opcode::OpcodeId;
use x86_symex_core::operand::OperandWrapper;
use x86_symex_core::register::GpRegisterName;
use x86_symex_core::session::Session;

fn bench_add_chain(c: &mut Criterion, hash_cons: bool) {
    let label = if hash_cons { "add_chain/hash_consed" } else { "add_chain/no_hash_consing" };
    c.bench_function(label, |b| {
        b.iter(|| {
            let config = SessionConfig::new(CpuBitSize::Bits64).with_hash_consing(hash_cons);
            let mut session = Session::new(config, 0x1000);
            let mut address = 0x1000u64;
            for step in 0..64u32 {
                let inst = Instruction::new(
                    address,
                    6,
                    OpcodeId::Add,
                    vec![
                        OperandWrapper::register(GpRegisterName::Eax),
                        OperandWrapper::immediate(u128::from(step), 32),
                    ],
                );
                session.build(&inst, false).unwrap();
                address = address.wrapping_add(6);
            }
            black_box(session);
        });
    });
}

fn bench_push_pop_chain(c: &mut Criterion) {
    c.bench_function("push_pop_chain", |b| {
        b.iter(|| {
            let mut session = Session::new(SessionConfig::new(CpuBitSize::Bits64), 0x1000);
            session
                .build(
                    &Instruction::new(0x1000, 7, OpcodeId::Mov, vec![
                        OperandWrapper::register(GpRegisterName::Rsp),
                        OperandWrapper::immediate(0x8000, 64),
                    ]),
                    false,
                )
                .unwrap();
            let mut address = 0x1007u64;
            for _ in 0..32 {
                session
                    .build(
                        &Instruction::new(address, 1, OpcodeId::Push, vec![OperandWrapper::register(
                            GpRegisterName::Rax,
                        )]),
                        false,
                    )
                    .unwrap();
                address = address.wrapping_add(1);
                session
                    .build(
                        &Instruction::new(address, 1, OpcodeId::Pop, vec![OperandWrapper::register(
                            GpRegisterName::Rbx,
                        )]),
                        false,
                    )
                    .unwrap();
                address = address.wrapping_add(1);
            }
            black_box(session);
        });
    });
}

fn benches(c: &mut Criterion) {
    bench_add_chain(c, true);
    bench_add_chain(c, false);
    bench_push_pop_chain(c);
}

criterion_group!(build_instruction, benches);
criterion_main!(build_instruction);
