extern crate mirrorbuf;
extern crate proptest;

use std::collections::VecDeque;

use mirrorbuf::{Error, Eviction, RingBuffer};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Write(Vec<u8>),
    ForceWrite(Vec<u8>),
    WriteByte(u8),
    ReadByte,
    Read(usize),
    Peek(usize),
    Skip(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Op::Write),
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Op::ForceWrite),
        any::<u8>().prop_map(Op::WriteByte),
        Just(Op::ReadByte),
        (0usize..12).prop_map(Op::Read),
        (0usize..12).prop_map(Op::Peek),
        (0usize..12).prop_map(Op::Skip),
    ]
}

/// Drives one operation against the ring buffer and a model FIFO queue,
/// asserting that outcomes, contents and capacity accounting agree.
fn apply(rb: &mut RingBuffer, model: &mut VecDeque<u8>, op: &Op) -> Result<(), TestCaseError> {
    let cap = rb.capacity() as usize;
    match *op {
        Op::Write(ref data) => {
            let result = rb.write_slice(data);
            if data.len() > cap {
                prop_assert_eq!(result, Err(Error::OutOfRange));
            } else if data.len() > cap - model.len() {
                prop_assert_eq!(result, Err(Error::BufferOverflow));
            } else {
                prop_assert_eq!(result, Ok(()));
                model.extend(data.iter().cloned());
            }
        }
        Op::ForceWrite(ref data) => {
            let mut lost = Vec::new();
            let result = rb
                .force_write_slice(data, Some(&mut |ev: Eviction| lost.extend_from_slice(ev.data)));
            if data.len() > cap {
                prop_assert_eq!(result, Err(Error::OutOfRange));
            } else {
                let writable = cap - model.len();
                let need = data.len().saturating_sub(writable);
                prop_assert_eq!(result, Ok(need as u16));
                let discarded: Vec<u8> = model.drain(..need).collect();
                prop_assert_eq!(&lost[..], &discarded[..]);
                model.extend(data.iter().cloned());
            }
        }
        Op::WriteByte(byte) => {
            let result = rb.write(byte);
            if model.len() == cap {
                prop_assert_eq!(result, Err(Error::BufferOverflow));
            } else {
                prop_assert_eq!(result, Ok(()));
                model.push_back(byte);
            }
        }
        Op::ReadByte => {
            let result = rb.read();
            match model.pop_front() {
                Some(byte) => prop_assert_eq!(result, Ok(byte)),
                None => prop_assert_eq!(result, Err(Error::NoData)),
            }
        }
        Op::Read(count) => {
            let mut out = vec![0u8; count];
            let result = rb.read_slice(&mut out);
            if count > cap {
                prop_assert_eq!(result, Err(Error::OutOfRange));
            } else if count > model.len() {
                prop_assert_eq!(result, Err(Error::NoData));
            } else {
                prop_assert_eq!(result, Ok(()));
                let expected: Vec<u8> = model.drain(..count).collect();
                prop_assert_eq!(out, expected);
            }
        }
        Op::Peek(count) => {
            let mut out = vec![0u8; count];
            let result = rb.peek_slice(&mut out);
            if count > cap {
                prop_assert_eq!(result, Err(Error::OutOfRange));
            } else if count > model.len() {
                prop_assert_eq!(result, Err(Error::NoData));
            } else {
                prop_assert_eq!(result, Ok(()));
                let expected: Vec<u8> = model.iter().take(count).cloned().collect();
                prop_assert_eq!(out, expected);
            }
        }
        Op::Skip(count) => {
            let result = rb.skip(count as u16);
            if count > cap {
                prop_assert_eq!(result, Err(Error::OutOfRange));
            } else if count > model.len() {
                prop_assert_eq!(result, Err(Error::NoData));
            } else {
                prop_assert_eq!(result, Ok(()));
                model.drain(..count);
            }
        }
    }
    prop_assert_eq!(rb.write_capacity() + rb.read_capacity(), rb.capacity());
    prop_assert_eq!(rb.read_capacity() as usize, model.len());
    Ok(())
}

proptest! {
    #[test]
    fn matches_model_queue(
        cap in 1u16..=8,
        ops in prop::collection::vec(op_strategy(), 0..48),
    ) {
        let mut rb = RingBuffer::with_capacity(cap).unwrap();
        let mut model = VecDeque::new();
        for op in &ops {
            apply(&mut rb, &mut model, op)?;
        }
    }

    #[test]
    fn defensive_check_never_fires(
        cap in 1u16..=8,
        ops in prop::collection::vec(op_strategy(), 0..64),
    ) {
        // Forced writes move the cycle flag from the write side; under any
        // interleaving with reads, peeks and skips the cursor-consistency
        // rejection must stay unobservable through the public operations.
        let mut rb = RingBuffer::with_capacity(cap).unwrap();
        for op in &ops {
            let result = match *op {
                Op::Write(ref data) => rb.write_slice(data),
                Op::ForceWrite(ref data) => rb.force_write_slice(data, None).map(|_| ()),
                Op::WriteByte(byte) => rb.write(byte),
                Op::ReadByte => rb.read().map(|_| ()),
                Op::Read(count) => rb.read_slice(&mut vec![0; count]),
                Op::Peek(count) => rb.peek_slice(&mut vec![0; count]),
                Op::Skip(count) => rb.skip(count as u16),
            };
            prop_assert_ne!(result, Err(Error::DataInvalid));
        }
    }

    #[test]
    fn forced_write_accounting(
        cap in 1u16..=8,
        prefill in prop::collection::vec(any::<u8>(), 0..8),
        data in prop::collection::vec(any::<u8>(), 1..8),
    ) {
        prop_assume!(prefill.len() <= cap as usize);
        prop_assume!(data.len() <= cap as usize);

        let mut rb = RingBuffer::with_capacity(cap).unwrap();
        rb.write_slice(&prefill).unwrap();
        let readable_before = rb.read_capacity();

        let evicted = rb.force_write_slice(&data, None).unwrap();
        prop_assert_eq!(
            rb.read_capacity() + evicted,
            readable_before + data.len() as u16
        );
    }

    #[test]
    fn peek_never_consumes(
        cap in 1u16..=8,
        data in prop::collection::vec(any::<u8>(), 1..8),
        count in 0usize..8,
    ) {
        prop_assume!(data.len() <= cap as usize);
        prop_assume!(count <= data.len());

        let mut rb = RingBuffer::with_capacity(cap).unwrap();
        rb.write_slice(&data).unwrap();

        let mut first = vec![0; count];
        let mut second = vec![0; count];
        rb.peek_slice(&mut first).unwrap();
        rb.peek_slice(&mut second).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(rb.read_capacity() as usize, data.len());
    }
}
