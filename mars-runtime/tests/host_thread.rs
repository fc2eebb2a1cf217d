use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use futures::executor::block_on;
use mars_runtime::{
    host_channel, EventType, HostDispatch, MemoryBuffer, RuntimeCore, RuntimeError, SyscallId,
    SyscallReturn,
};

#[test]
fn panic_hook_runs_on_the_host_thread() {
    let (handle, pump) = host_channel();
    let host_thread = thread::current().id();
    let seen = Arc::new(Mutex::new(None));

    let sink = seen.clone();
    let rt = RuntimeCore::builder()
        .with_host(Arc::new(handle))
        .with_panic_hook(move |code, msg| {
            *sink.lock().unwrap() = Some((thread::current().id(), code, msg.to_string()));
        })
        .build()
        .unwrap();

    let vm = thread::spawn(move || {
        let mut mem = MemoryBuffer::new(8);
        mem.write_bytes(0, b"bye\0").unwrap();
        let err = rt.invoke(&mut mem, SyscallId::Panic, &[3, 0]).unwrap_err();
        matches!(err, RuntimeError::GuestPanic { code: 3, .. })
        // rt, and with it the host handle, drops here
    });

    pump.run();
    assert!(vm.join().unwrap());
    assert_eq!(*seen.lock().unwrap(), Some((host_thread, 3, "bye".to_string())));
}

#[test]
fn input_from_host_reaches_vm() {
    let rt = RuntimeCore::builder().build().unwrap();
    let hub = rt.input_hub();

    let host = thread::spawn(move || {
        hub.pointer_pressed(1, 2);
        hub.pointer_moved(3, 4);
        hub.pointer_released(3, 4);
        hub.close();
    });

    let mut mem = MemoryBuffer::new(12);
    let mut seen = Vec::new();
    while seen.last() != Some(&(EventType::Close as i32)) {
        block_on(rt.events().wait_nonempty());
        match rt.invoke(&mut mem, SyscallId::GetEvent, &[0]).unwrap() {
            SyscallReturn::I32(1) => seen.push(mem.read::<i32>(0).unwrap()),
            other => panic!("unexpected {:?}", other),
        }
    }
    host.join().unwrap();

    assert_eq!(seen, vec![8, 10, 9, 1]);
}

#[test]
fn vm_thread_can_block_for_input() {
    let rt = RuntimeCore::builder().build().unwrap();
    assert!(!rt.wait_event(Some(Duration::from_millis(5))));

    let hub = rt.input_hub();
    let host = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        hub.key_pressed(65);
    });

    assert!(rt.wait_event(None));
    host.join().unwrap();

    let mut mem = MemoryBuffer::new(12);
    assert!(rt.poll_event(&mut mem, 0).unwrap());
    assert_eq!(mem.read::<i32>(0).unwrap(), EventType::KeyPressed as i32);
    assert_eq!(mem.read::<i32>(4).unwrap(), 65);
}

#[test]
fn run_on_host_waits_for_the_pump() {
    let (handle, pump) = host_channel();
    let host_thread = thread::current().id();
    let rt = RuntimeCore::builder().with_host(Arc::new(handle)).build().unwrap();

    let vm = thread::spawn(move || {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        rt.run_on_host(move || sink.lock().unwrap().push(thread::current().id()));
        // run_on_host returned, so the action has already run
        let after_first = seen.lock().unwrap().len();

        let sink = seen.clone();
        rt.host().run_blocking(Box::new(move || sink.lock().unwrap().push(thread::current().id())));
        let ids = seen.lock().unwrap().clone();
        (after_first, ids)
    });

    pump.run();
    let (after_first, ids) = vm.join().unwrap();
    assert_eq!(after_first, 1);
    assert_eq!(ids, vec![host_thread, host_thread]);
}
