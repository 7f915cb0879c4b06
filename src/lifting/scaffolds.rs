//! Embedded JavaScript scaffolds for the runtime-assisted mutators.
//!
//! Each scaffold is emitted once, ahead of the first use of its opcode. The
//! generated program communicates back to the fuzzing host by printing
//! lines with a fixed, case-sensitive tag prefix over the host print
//! channel. Failures inside a scaffold never escape the generated program:
//! everything is caught and reported over the same channel.
//!
//! The host channel is `fuzzilli('FUZZILLI_PRINT', ...)`; every scaffold
//! re-binds that name defensively so lifted programs stay runnable in
//! plain shells.

/// Output tags parsed back by the fuzzing host.
pub const EXPLORE_ACTION_TAG: &str = "EXPLORE_ACTION:";
pub const EXPLORE_FAILURE_TAG: &str = "EXPLORE_FAILURE:";
pub const EXPLORE_ERROR_TAG: &str = "EXPLORE_ERROR:";
pub const PROBING_RESULTS_TAG: &str = "PROBING_RESULTS:";
pub const PROBING_ERROR_TAG: &str = "PROBING_ERROR:";
pub const FIXUP_ACTION_TAG: &str = "FIXUP_ACTION:";
pub const FIXUP_FAILURE_TAG: &str = "FIXUP_FAILURE:";
pub const FIXUP_ERROR_TAG: &str = "FIXUP_ERROR:";

pub const EXPLORE_SCAFFOLD: &str = r#"const explore = (function() {
    if (typeof fuzzilli === 'undefined') {
        fuzzilli = function(op, arg) { if (op === 'FUZZILLI_PRINT') print(arg); };
    }
    function report(tag, payload) {
        fuzzilli('FUZZILLI_PRINT', tag + JSON.stringify(payload));
    }
    function mulberry32(seed) {
        let s = seed >>> 0;
        return function() {
            s |= 0; s = s + 0x6D2B79F5 | 0;
            let t = Math.imul(s ^ s >>> 15, 1 | s);
            t = t + Math.imul(t ^ t >>> 7, 61 | t) ^ t;
            return ((t ^ t >>> 14) >>> 0) / 4294967296;
        };
    }
    return function explore(id, value, thisArg, args, seed) {
        const rand = mulberry32(seed);
        try {
            const actions = [];
            if (typeof value === 'function') {
                actions.push({ operation: 'CALL_FUNCTION', inputs: args.length });
                actions.push({ operation: 'CONSTRUCT', inputs: args.length });
            }
            if (value !== null && typeof value === 'object') {
                for (const name of Object.getOwnPropertyNames(value)) {
                    actions.push({ operation: 'GET_PROPERTY', property: name });
                    if (typeof value[name] === 'function') {
                        actions.push({ operation: 'CALL_METHOD', property: name });
                    }
                }
            }
            if (typeof value === 'number' || typeof value === 'bigint') {
                actions.push({ operation: 'BINARY_OP' });
            }
            if (actions.length === 0) {
                report('EXPLORE_FAILURE:', { id: id, reason: 'no applicable actions' });
                return;
            }
            const action = actions[Math.floor(rand() * actions.length)];
            switch (action.operation) {
                case 'CALL_FUNCTION': value.apply(thisArg, args); break;
                case 'CONSTRUCT': Reflect.construct(value, args); break;
                case 'GET_PROPERTY': value[action.property]; break;
                case 'CALL_METHOD': value[action.property].apply(value, args); break;
                case 'BINARY_OP': value + value; break;
            }
            report('EXPLORE_ACTION:', { id: id, action: action });
        } catch (e) {
            report('EXPLORE_ERROR:', { id: id, error: String(e) });
        }
    };
})();"#;

pub const PROBE_SCAFFOLD: &str = r#"const probe = (function() {
    if (typeof fuzzilli === 'undefined') {
        fuzzilli = function(op, arg) { if (op === 'FUZZILLI_PRINT') print(arg); };
    }
    const observations = { };
    function record(id, key) {
        if (!observations[id]) observations[id] = { };
        observations[id][key] = (observations[id][key] || 0) + 1;
    }
    function summarize(value) {
        try {
            if (value === null) return 'null';
            const type = typeof value;
            if (type !== 'object' && type !== 'function') return type;
            const proto = Object.getPrototypeOf(value);
            const names = Object.getOwnPropertyNames(value).slice(0, 16);
            return { type: type, prototype: proto ? String(proto.constructor && proto.constructor.name) : 'null', properties: names };
        } catch (e) {
            return 'unsummarizable';
        }
    }
    function flush() {
        try {
            fuzzilli('FUZZILLI_PRINT', 'PROBING_RESULTS:' + JSON.stringify(observations));
        } catch (e) {
            fuzzilli('FUZZILLI_PRINT', 'PROBING_ERROR:' + String(e));
        }
    }
    if (typeof globalThis !== 'undefined' && typeof globalThis.onExitHooks !== 'undefined') {
        globalThis.onExitHooks.push(flush);
    } else {
        probeFlush = flush;
    }
    return function probe(id, value) {
        try {
            record(id, JSON.stringify(summarize(value)));
            fuzzilli('FUZZILLI_PRINT', 'PROBING_RESULTS:' + JSON.stringify({ id: id, value: summarize(value) }));
        } catch (e) {
            fuzzilli('FUZZILLI_PRINT', 'PROBING_ERROR:' + JSON.stringify({ id: id, error: String(e) }));
        }
    };
})();"#;

pub const FIXUP_SCAFFOLD: &str = r#"const fixup = (function() {
    if (typeof fuzzilli === 'undefined') {
        fuzzilli = function(op, arg) { if (op === 'FUZZILLI_PRINT') print(arg); };
    }
    function report(tag, payload) {
        fuzzilli('FUZZILLI_PRINT', tag + JSON.stringify(payload));
    }
    return function fixup(id, action, value, thisArg, args) {
        try {
            let result;
            switch (action) {
                case 'CALL':
                    result = value.apply(thisArg, args);
                    break;
                case 'CONSTRUCT':
                    result = Reflect.construct(value, args);
                    break;
                case 'GET_PROPERTY':
                    result = value[args[0]];
                    break;
                case 'SET_PROPERTY':
                    value[args[0]] = args[1];
                    result = args[1];
                    break;
                default:
                    report('FIXUP_FAILURE:', { id: id, action: action, reason: 'unknown action' });
                    return undefined;
            }
            report('FIXUP_ACTION:', { id: id, action: action });
            return result;
        } catch (e) {
            report('FIXUP_ERROR:', { id: id, action: action, error: String(e) });
            return undefined;
        }
    };
})();"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffolds_carry_their_protocol_tags() {
        assert!(EXPLORE_SCAFFOLD.contains("EXPLORE_ACTION:"));
        assert!(EXPLORE_SCAFFOLD.contains("EXPLORE_FAILURE:"));
        assert!(EXPLORE_SCAFFOLD.contains("EXPLORE_ERROR:"));
        assert!(PROBE_SCAFFOLD.contains("PROBING_RESULTS:"));
        assert!(PROBE_SCAFFOLD.contains("PROBING_ERROR:"));
        assert!(FIXUP_SCAFFOLD.contains("FIXUP_ACTION:"));
        assert!(FIXUP_SCAFFOLD.contains("FIXUP_FAILURE:"));
        assert!(FIXUP_SCAFFOLD.contains("FIXUP_ERROR:"));
    }

    #[test]
    fn scaffolds_rebind_the_host_channel() {
        for scaffold in [EXPLORE_SCAFFOLD, PROBE_SCAFFOLD, FIXUP_SCAFFOLD] {
            assert!(scaffold.contains("typeof fuzzilli === 'undefined'"));
            assert!(scaffold.contains("FUZZILLI_PRINT"));
        }
    }
}
