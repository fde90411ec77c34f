use std::{future::Future, ops::ControlFlow, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

/// Runs `task` once `delay` has elapsed.
pub fn schedule_after<Fut>(delay: Duration, task: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let deadline = Instant::now() + delay;
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        task.await;
    })
}

/// Calls `tick` every `period`, starting one period from now, until it
/// returns `ControlFlow::Break`.
pub async fn repeat_every<F>(period: Duration, mut tick: F)
where
    F: FnMut() -> ControlFlow<()>,
{
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    // A late tick is simulated once; the match does not try to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if tick().is_break() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_waits_for_its_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        schedule_after(Duration::from_millis(500), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_stops_on_break() {
        let mut ticks = 0;
        let started = Instant::now();
        repeat_every(Duration::from_millis(16), || {
            ticks += 1;
            if ticks == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;
        assert_eq!(ticks, 3);
        assert_eq!(started.elapsed(), Duration::from_millis(48));
    }
}
