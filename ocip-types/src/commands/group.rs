//! Group provisioning commands.

crate::entity! {
    /// Profile block shared by service instances such as call centers and
    /// hunt groups.
    pub struct ServiceInstanceReadProfile19sp1: Type, "ServiceInstanceReadProfile19sp1" {
        name, "name": scalar(String), required;
        calling_line_id_last_name, "callingLineIdLastName": scalar(String), optional;
        calling_line_id_first_name, "callingLineIdFirstName": scalar(String), optional;
        hiragana_last_name, "hiraganaLastName": scalar(String), optional;
        hiragana_first_name, "hiraganaFirstName": scalar(String), optional;
        extension, "extension": scalar(String), optional;
        language, "language": scalar(String), optional;
        time_zone, "timeZone": scalar(String), optional;
        time_zone_display_name, "timeZoneDisplayName": scalar(String), optional;
        alias, "alias": repeated(scalar(String)), optional;
    }
}

crate::entity! {
    /// Call center instance settings. The wire `type` element maps to
    /// `center_type` internally.
    pub struct GroupCallCenterGetInstanceResponse22: DataResponse,
        "GroupCallCenterGetInstanceResponse22" {
        service_instance_profile, "serviceInstanceProfile":
            composite(ServiceInstanceReadProfile19sp1), optional;
        center_type, "type": scalar(String), optional;
        policy, "policy": scalar(String), optional;
        enable_video, "enableVideo": scalar(Bool), optional;
        queue_length, "queueLength": scalar(Int), optional;
        allow_caller_to_dial_escape_digit, "allowCallerToDialEscapeDigit": scalar(Bool), optional;
        escape_digit, "escapeDigit": scalar(String), nullable;
        reset_call_statistics_upon_entry_in_queue, "resetCallStatisticsUponEntryInQueue":
            scalar(Bool), optional;
        allow_agent_logoff, "allowAgentLogoff": scalar(Bool), optional;
        allow_call_waiting_for_agents, "allowCallWaitingForAgents": scalar(Bool), optional;
        external_preferred_audio_codec, "externalPreferredAudioCodec": scalar(String), optional;
        internal_preferred_audio_codec, "internalPreferredAudioCodec": scalar(String), optional;
        play_ringing_when_offering_call, "playRingingWhenOfferingCall": scalar(Bool), optional;
    }
}
