//! Message formatting utilities for client display.

use missionlink_shared::{
    protocol::{ClientJoinData, RejectReason, ServerParams},
    time::timestamp_to_rfc3339,
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a join notice. The copy about ourselves is marked with "(me)".
    pub fn format_client_joined(client: &ClientJoinData, is_me: bool) -> String {
        let me_suffix = if is_me { " (me)" } else { "" };
        let host_suffix = if client.is_host { " [host]" } else { "" };
        format!(
            "\n+ {}{}{} joined at {}\n",
            client.name,
            me_suffix,
            host_suffix,
            timestamp_to_rfc3339(client.join_time)
        )
    }

    pub fn format_client_dropped(name: &str) -> String {
        format!("\n- {} left the server\n", name)
    }

    pub fn format_ready_status(name: &str, ready: bool) -> String {
        let status = if ready { "ready" } else { "not ready" };
        format!("\n* {} is {}\n", name, status)
    }

    /// Format the server parameter block shown on join and slot changes
    pub fn format_server_params(params: &ServerParams) -> String {
        let mission = params.mission_name.as_deref().unwrap_or("(none)");
        let state = if params.mission_running {
            "running"
        } else {
            "stopped"
        };
        format!(
            "\n{rule}\n\
             Server: {host}\n\
             Mission: {mission} (seq {seq}, {state})\n\
             Public slots: {pu} used / {pf} free\n\
             Private slots: {vu} used / {vf} free\n\
             {rule}\n",
            rule = RULE,
            host = params.host_name,
            mission = mission,
            seq = params.sequence,
            state = state,
            pu = params.public_slots_used,
            pf = params.public_slots_free,
            vu = params.private_slots_used,
            vf = params.private_slots_free,
        )
    }

    pub fn format_rejection(reason: RejectReason) -> String {
        format!("Connection rejected ({}): {}", reason.code(), reason)
    }

    /// Format a loading progress line, e.g. `Loading objects [#####.....] 50%`
    pub fn format_progress(label: &str, progress: f32) -> String {
        let progress = progress.clamp(0.0, 1.0);
        let filled = (progress * 10.0).round() as usize;
        format!(
            "\r{} [{}{}] {:>3}%",
            label,
            "#".repeat(filled),
            ".".repeat(10 - filled),
            (progress * 100.0).round() as u32
        )
    }

    pub fn format_phase_started(phase: u8, mission: &str) -> String {
        format!("\nMission download phase {} for '{}'\n", phase, mission)
    }

    pub fn format_spawned(position: [f32; 3]) -> String {
        format!(
            "\nSpawned at ({:.1}, {:.1}, {:.1})\n",
            position[0], position[1], position[2]
        )
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use missionlink_shared::protocol::MissionSequence;

    fn join_data(name: &str, is_host: bool) -> ClientJoinData {
        ClientJoinData {
            client_id: "c1".to_string(),
            name: name.to_string(),
            identity: String::new(),
            is_host,
            invited: false,
            ready: false,
            score: 0,
            join_time: 1672531200000,
            join_in_progress: false,
        }
    }

    #[test]
    fn test_format_client_joined_marks_self_and_host() {
        // テスト項目: 自分自身とホストにマークが付く
        // given (前提条件):
        let client = join_data("Alice", true);

        // when (操作):
        let me = MessageFormatter::format_client_joined(&client, true);
        let other = MessageFormatter::format_client_joined(&join_data("Bob", false), false);

        // then (期待する結果):
        assert!(me.contains("+ Alice (me) [host]"));
        assert!(me.contains("2023-01-01"));
        assert!(other.contains("+ Bob joined at"));
        assert!(!other.contains("(me)"));
    }

    #[test]
    fn test_format_server_params() {
        // テスト項目: サーバーパラメータのスロット数とミッションが表示される
        // given (前提条件):
        let params = ServerParams {
            host_name: "Marble Host".to_string(),
            mission_name: Some("beginner/learn_the_roll".to_string()),
            sequence: MissionSequence::new(3),
            mission_running: true,
            public_slots_used: 2,
            public_slots_free: 4,
            private_slots_used: 1,
            private_slots_free: 1,
        };

        // when (操作):
        let result = MessageFormatter::format_server_params(&params);

        // then (期待する結果):
        assert!(result.contains("Server: Marble Host"));
        assert!(result.contains("beginner/learn_the_roll (seq 3, running)"));
        assert!(result.contains("Public slots: 2 used / 4 free"));
        assert!(result.contains("Private slots: 1 used / 1 free"));
    }

    #[test]
    fn test_format_rejection_includes_code() {
        // テスト項目: 拒否理由のコードと説明が表示される
        // given (前提条件):
        let reason = RejectReason::ServerFull;

        // when (操作):
        let result = MessageFormatter::format_rejection(reason);

        // then (期待する結果):
        assert_eq!(
            result,
            "Connection rejected (CR_SERVERFULL): the server is full"
        );
    }

    #[test]
    fn test_format_progress_is_clamped() {
        // テスト項目: 進捗バーが 0〜100% に収まる
        // given (前提条件):

        // when (操作):
        let half = MessageFormatter::format_progress("Lighting", 0.5);
        let over = MessageFormatter::format_progress("Lighting", 1.7);

        // then (期待する結果):
        assert!(half.contains("[#####.....]"));
        assert!(half.ends_with(" 50%"));
        assert!(over.contains("[##########]"));
        assert!(over.ends_with("100%"));
    }

    #[test]
    fn test_format_ready_and_drop() {
        // テスト項目: 準備状態と離脱の通知が正しくフォーマットされる
        // given (前提条件):

        // when (操作):
        let ready = MessageFormatter::format_ready_status("Bob", true);
        let dropped = MessageFormatter::format_client_dropped("Bob");

        // then (期待する結果):
        assert!(ready.contains("Bob is ready"));
        assert!(dropped.contains("- Bob left the server"));
    }
}
