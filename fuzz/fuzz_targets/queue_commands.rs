#![no_main]

use libfuzzer_sys::fuzz_target;
use tunepane::audio::NullAudioEngine;
use tunepane::model::{MoveDirection, TrackRef};
use tunepane::queue::PlaybackQueue;

fn tracks(count: usize, serial: &mut usize) -> Vec<TrackRef> {
    (0..count)
        .map(|_| {
            *serial += 1;
            TrackRef::from_path(format!("track_{serial}.mp3"))
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let mut queue = PlaybackQueue::new(Box::new(NullAudioEngine::new()));
    let mut serial = 0;

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = usize::from(pair.get(1).copied().unwrap_or_default() % 16);
        match op % 9 {
            0 => queue.set_queue(tracks(arg % 6, &mut serial)),
            1 => queue.append(tracks(arg % 4, &mut serial)),
            2 => queue.remove(arg),
            3 => queue.move_item(arg, MoveDirection::Up),
            4 => queue.move_item(arg, MoveDirection::Down),
            5 => queue.next(),
            6 => queue.prev(),
            7 => queue.play_index(arg),
            _ => queue.toggle_pause(),
        }

        assert_eq!(queue.current_index().is_none(), queue.is_empty());
        if let Some(idx) = queue.current_index() {
            assert!(idx < queue.len());
        }
    }

    queue.stop();
});
